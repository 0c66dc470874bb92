use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Lambda binaries of `mentorship_lambda`, packaged as `<name>_function.zip`.
const LAMBDA_FUNCTIONS: &[(&str, &str)] = &[
    ("register", "register_lambda"),
    ("login", "login_lambda"),
    ("confirm", "confirm_lambda"),
    ("resend", "resend_lambda"),
    ("me", "me_lambda"),
    ("upload", "upload_lambda"),
    ("download", "download_lambda"),
    ("list", "list_lambda"),
    ("delete", "delete_lambda"),
];

const LAMBDA_PACKAGE: &str = "mentorship_lambda";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the mentorship backend workspace",
    long_about = "Runs CI checks and packages the Lambda functions consumed by\n\
                  the infrastructure layer."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build every Lambda binary and write `<output>/<name>_function.zip`
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory the zip artifacts are written to
        #[arg(long, default_value = "output", env = "LAMBDA_OUTPUT_DIR")]
        output: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Workspace tests
    Test,
    /// Lint + test
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> io::Result<ExitStatus> {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo").args(args).status()
}

fn run_cargo(args: &[&str]) {
    match cargo(args) {
        Ok(status) if status.success() => {}
        Ok(status) => exit(status.code().unwrap_or(1)),
        Err(error) => fail(&format!("failed to execute cargo: {error}")),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    exit(1)
}

fn package_serverless_lambdas(target: &str, profile: BuildProfile, output: &Path) {
    ensure_rust_target_installed(target);

    step("Build lambda binaries");
    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for (_, binary) in LAMBDA_FUNCTIONS {
        cargo_args.extend(["--bin", binary]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    if let Err(error) = fs::create_dir_all(output) {
        fail(&format!(
            "failed to create output directory '{}': {error}",
            output.display()
        ));
    }

    let mut packaged = Vec::with_capacity(LAMBDA_FUNCTIONS.len());
    for (function, binary) in LAMBDA_FUNCTIONS {
        let binary_path = target_dir.join(binary_name(binary, target));
        let zip_path = output.join(format!("{function}_function.zip"));
        if let Err(error) = package_lambda_zip(&binary_path, &zip_path) {
            fail(&format!(
                "failed to package '{}' into '{}': {error}",
                binary_path.display(),
                zip_path.display()
            ));
        }
        packaged.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in packaged {
        eprintln!("- {}", path.display());
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        fail(&format!(
            "failed to list installed rust targets: {}",
            stderr.trim()
        ));
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        fail(&format!(
            "rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- serverless-package`"
        ));
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

/// Writes `binary_path` into a zip as an executable `bootstrap` entry, the
/// layout the `provided` Lambda runtimes expect.
fn package_lambda_zip(binary_path: &Path, zip_path: &Path) -> io::Result<()> {
    let binary = fs::read(binary_path)?;
    let file = fs::File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);

    zip.start_file("bootstrap", options)?;
    zip.write_all(&binary)?;
    zip.finish()?;
    Ok(())
}

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test mentorship_core");
    run_cargo(&["test", "-p", "mentorship_core"]);

    step("Test mentorship_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage {
            target,
            profile,
            output,
        } => {
            package_serverless_lambdas(&target, profile, &output);
        }
    }
}

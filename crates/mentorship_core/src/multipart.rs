//! Minimal `multipart/form-data` decoding for upload bodies.
//!
//! Parts are split on raw bytes so binary file content survives untouched.

use thiserror::Error;

use crate::error::ServiceError;

const CRLF: &[u8] = b"\r\n";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultipartError {
    #[error("multipart content type has no boundary")]
    MissingBoundary,

    #[error("multipart body does not contain the declared boundary")]
    BoundaryNotFound,

    #[error("multipart part is not terminated by a boundary")]
    UnterminatedPart,

    #[error("multipart part header is malformed: {0}")]
    MalformedHeader(String),

    #[error("multipart body contains no file part")]
    NoFilePart,
}

impl From<MultipartError> for ServiceError {
    fn from(error: MultipartError) -> Self {
        ServiceError::Validation(error.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl MultipartPart {
    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }

    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
}

/// Reads the `boundary` parameter from a `multipart/form-data` content type.
pub fn boundary_from_content_type(content_type: &str) -> Result<String, MultipartError> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|parameter| parameter.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| unquote(value.trim()).to_string())
        .filter(|boundary| !boundary.is_empty())
        .ok_or(MultipartError::MissingBoundary)
}

pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<MultipartPart>, MultipartError> {
    let delimiter = [b"--".as_slice(), boundary.as_bytes()].concat();
    let closing = [CRLF, delimiter.as_slice()].concat();

    let start = find(body, &delimiter, 0).ok_or(MultipartError::BoundaryNotFound)?;
    let mut position = start + delimiter.len();
    let mut parts = Vec::new();

    loop {
        if body[position..].starts_with(b"--") {
            break;
        }

        position = skip_line_end(body, position);

        let part_end = find(body, &closing, position).ok_or(MultipartError::UnterminatedPart)?;
        parts.push(parse_part(&body[position..part_end])?);
        position = part_end + closing.len();

        if position >= body.len() {
            return Err(MultipartError::UnterminatedPart);
        }
    }

    Ok(parts)
}

/// First part that carries a file name.
pub fn first_file_part(parts: &[MultipartPart]) -> Result<&MultipartPart, MultipartError> {
    parts
        .iter()
        .find(|part| part.is_file())
        .ok_or(MultipartError::NoFilePart)
}

/// Text value of a named non-file field.
pub fn field_value<'a>(parts: &'a [MultipartPart], name: &str) -> Option<&'a str> {
    parts
        .iter()
        .filter(|part| !part.is_file())
        .find(|part| part.name.as_deref() == Some(name))
        .and_then(MultipartPart::text)
        .map(str::trim)
}

fn parse_part(raw: &[u8]) -> Result<MultipartPart, MultipartError> {
    let (header_block, data) = if raw.starts_with(CRLF) {
        (&raw[..0], &raw[CRLF.len()..])
    } else {
        match find(raw, HEADER_TERMINATOR, 0) {
            Some(index) => (&raw[..index], &raw[index + HEADER_TERMINATOR.len()..]),
            None => {
                return Err(MultipartError::MalformedHeader(
                    "missing blank line after headers".to_string(),
                ))
            }
        }
    };

    let headers = std::str::from_utf8(header_block).map_err(|_| {
        MultipartError::MalformedHeader("headers are not valid UTF-8".to_string())
    })?;

    let mut part = MultipartPart {
        data: data.to_vec(),
        ..MultipartPart::default()
    };

    for line in headers.split("\r\n").filter(|line| !line.trim().is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| MultipartError::MalformedHeader(line.to_string()))?;
        let value = value.trim();

        if name.trim().eq_ignore_ascii_case("content-disposition") {
            for parameter in value.split(';').skip(1) {
                let Some((key, raw_value)) = parameter.split_once('=') else {
                    continue;
                };
                let parameter_value = unquote(raw_value.trim()).to_string();
                match key.trim().to_ascii_lowercase().as_str() {
                    "name" => part.name = Some(parameter_value),
                    "filename" => part.file_name = Some(parameter_value),
                    _ => {}
                }
            }
        } else if name.trim().eq_ignore_ascii_case("content-type") {
            part.content_type = Some(value.to_string());
        }
    }

    Ok(part)
}

fn skip_line_end(body: &[u8], position: usize) -> usize {
    let mut cursor = position;
    while cursor < body.len() && matches!(body[cursor], b' ' | b'\t') {
        cursor += 1;
    }
    if body[cursor..].starts_with(CRLF) {
        cursor + CRLF.len()
    } else if body[cursor..].starts_with(b"\n") {
        cursor + 1
    } else {
        position
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| offset + from)
}

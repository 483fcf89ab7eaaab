//! In-memory `multipart/form-data` reader.
//!
//! Text parts become form values, parts carrying a `filename` are kept as [`FilePart`]s.
//! Part payloads are sliced out of the captured body without copying.

use crate::values::FormValues;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("missing boundary in multipart content type")]
    MissingBoundary,
    #[error("multipart body too large: {size} bytes exceeds limit of {max}")]
    TooLarge { size: usize, max: usize },
    #[error("missing content-disposition header in part")]
    MissingContentDisposition,
    #[error("invalid content-disposition: {0}")]
    InvalidContentDisposition(&'static str),
    #[error("invalid part headers: {0}")]
    InvalidPartHeaders(&'static str),
    #[error("text part `{0}` is not valid utf-8")]
    InvalidText(String),
    #[error("invalid multipart format: {0}")]
    InvalidFormat(&'static str),
    #[error("unexpected end of multipart data")]
    UnexpectedEof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub values: FormValues,
    pub files: Vec<FilePart>,
}

/// Parses a complete multipart body, rejecting bodies larger than `max_memory`
pub fn parse(body: &Bytes, boundary: Option<&str>, max_memory: usize) -> Result<MultipartForm, MultipartError> {
    let boundary = boundary.filter(|b| !b.is_empty()).ok_or(MultipartError::MissingBoundary)?;
    if body.len() > max_memory {
        return Err(MultipartError::TooLarge { size: body.len(), max: max_memory });
    }

    let delimiter = format!("--{boundary}").into_bytes();
    let mut form = MultipartForm::default();
    let mut pos = find_boundary(body, &delimiter, 0)?;

    loop {
        let boundary_end = pos + delimiter.len();
        if matches!(body.get(boundary_end..boundary_end + 2), Some(b"--")) {
            break;
        }

        pos = boundary_end;
        match body.get(pos..pos + 2) {
            Some(b"\r\n") => pos += 2,
            Some(_) => return Err(MultipartError::InvalidFormat("expected CRLF after boundary")),
            None => return Err(MultipartError::UnexpectedEof),
        }

        let (headers, header_end) = parse_part_headers(body, pos)?;
        pos = header_end;

        let disposition = headers.get("content-disposition").ok_or(MultipartError::MissingContentDisposition)?;
        let (name, filename) = parse_content_disposition(disposition)?;

        let data_end = find_boundary(body, &delimiter, pos)?;
        let data = if data_end >= pos + 2 && &body[data_end - 2..data_end] == b"\r\n" {
            body.slice(pos..data_end - 2)
        } else {
            body.slice(pos..data_end)
        };

        match filename {
            Some(filename) => form.files.push(FilePart {
                name,
                filename,
                content_type: headers.get("content-type").cloned(),
                bytes: data,
            }),
            None => {
                let text = std::str::from_utf8(&data).map_err(|_utf8| MultipartError::InvalidText(name.clone()))?;
                form.values.append(name, text);
            }
        }

        pos = data_end;
    }

    Ok(form)
}

fn find_boundary(data: &[u8], delimiter: &[u8], start: usize) -> Result<usize, MultipartError> {
    if data.len() < delimiter.len() {
        return Err(MultipartError::UnexpectedEof);
    }

    for i in start..=data.len() - delimiter.len() {
        if !data[i..].starts_with(delimiter) {
            continue;
        }

        // a delimiter starts the body or a CRLF line, and is followed by CRLF or `--`
        if i != 0 && (i < 2 || &data[i - 2..i] != b"\r\n") {
            continue;
        }

        let end = i + delimiter.len();
        match data.get(end..end + 2) {
            Some(b"\r\n" | b"--") => return Ok(i),
            Some(_) => {}
            None => return Err(MultipartError::UnexpectedEof),
        }
    }

    Err(MultipartError::UnexpectedEof)
}

fn parse_part_headers(data: &[u8], start: usize) -> Result<(HashMap<String, String>, usize), MultipartError> {
    let mut headers = HashMap::new();
    let mut pos = start;

    loop {
        let line_end = find_crlf(data, pos)?;
        let line = &data[pos..line_end];
        if line.is_empty() {
            return Ok((headers, line_end + 2));
        }

        let line = std::str::from_utf8(line).map_err(|_utf8| MultipartError::InvalidPartHeaders("invalid utf-8 in header"))?;
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_owned());
        }

        pos = line_end + 2;
    }
}

fn find_crlf(data: &[u8], start: usize) -> Result<usize, MultipartError> {
    data.get(start..)
        .and_then(|rest| rest.windows(2).position(|w| w == b"\r\n"))
        .map(|offset| start + offset)
        .ok_or(MultipartError::UnexpectedEof)
}

/// `form-data; name="field"; filename="file.txt"`
fn parse_content_disposition(value: &str) -> Result<(String, Option<String>), MultipartError> {
    let mut name = None;
    let mut filename = None;

    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("name") {
            name = Some(unquote(raw));
        } else if key.eq_ignore_ascii_case("filename") {
            let unquoted = unquote(raw);
            if unquoted.contains("..") || unquoted.contains(['/', '\\', '\0']) {
                return Err(MultipartError::InvalidContentDisposition("filename contains path separators"));
            }
            filename = Some(unquoted);
        }
    }

    let name = name.ok_or(MultipartError::InvalidContentDisposition("missing name parameter"))?;
    Ok((name, filename))
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    s.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')).unwrap_or(s).to_owned()
}

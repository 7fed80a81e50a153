//! Plain HTTP/1.1 over a Unix domain socket, one request per connection.
//! This is all the docker daemon's local endpoint needs.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to connect to unix socket '{path}': {source}")]
    Connect {
        path: String,
        source: std::io::Error,
    },
    #[error("i/o error on unix socket: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed http response: {0}")]
    Parse(String),
}

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    /// Header value, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Issue a single GET and read the response to completion. The request
/// carries `Connection: close`, so the peer's EOF delimits the exchange.
pub fn get(socket: &Path, path: &str) -> Result<Response, HttpError> {
    let mut stream = UnixStream::connect(socket).map_err(|source| HttpError::Connect {
        path: socket.display().to_string(),
        source,
    })?;

    let request = format!(
        "GET {path} HTTP/1.1\r\n\
         Host: localhost\r\n\
         Accept: application/json\r\n\
         Connection: close\r\n\
         \r\n"
    );
    stream.write_all(request.as_bytes())?;
    stream.flush()?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw)?;

    parse_response(&raw)
}

fn parse_response(data: &[u8]) -> Result<Response, HttpError> {
    let mut reader = BufReader::new(data);

    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .map_err(|e| HttpError::Parse(format!("failed to read status line: {e}")))?;

    // e.g. "HTTP/1.1 200 OK"
    let mut parts = status_line.trim().splitn(3, ' ');
    let _version = parts
        .next()
        .filter(|v| v.starts_with("HTTP/"))
        .ok_or_else(|| HttpError::Parse(format!("invalid status line: {}", status_line.trim())))?;
    let status: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| HttpError::Parse(format!("invalid status line: {}", status_line.trim())))?;

    let mut headers = HashMap::new();
    let mut content_length: Option<usize> = None;
    let mut chunked = false;

    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| HttpError::Parse(format!("failed to read header: {e}")))?;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }

        if let Some((name, value)) = trimmed.split_once(':') {
            let name = name.trim().to_string();
            let value = value.trim().to_string();

            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().ok();
            }
            if name.eq_ignore_ascii_case("transfer-encoding")
                && value.to_lowercase().contains("chunked")
            {
                chunked = true;
            }

            headers.insert(name, value);
        }
    }

    let body = if chunked {
        read_chunked_body(&mut reader)?
    } else if let Some(len) = content_length {
        let mut body = vec![0u8; len];
        reader
            .read_exact(&mut body)
            .map_err(|e| HttpError::Parse(format!("failed to read body: {e}")))?;
        body
    } else {
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        body
    };

    Ok(Response {
        status,
        headers,
        body,
    })
}

fn read_chunked_body(reader: &mut BufReader<&[u8]>) -> Result<Vec<u8>, HttpError> {
    let mut body = Vec::new();

    loop {
        let mut size_line = String::new();
        reader
            .read_line(&mut size_line)
            .map_err(|e| HttpError::Parse(format!("failed to read chunk size: {e}")))?;

        let size_str = size_line.trim().split(';').next().unwrap_or("0");
        let chunk_size = usize::from_str_radix(size_str, 16)
            .map_err(|_| HttpError::Parse(format!("invalid chunk size: {size_str}")))?;

        if chunk_size == 0 {
            // Trailing CRLF after the last chunk.
            let mut trailer = String::new();
            reader.read_line(&mut trailer).ok();
            break;
        }

        let mut chunk = vec![0u8; chunk_size];
        reader
            .read_exact(&mut chunk)
            .map_err(|e| HttpError::Parse(format!("failed to read chunk: {e}")))?;
        body.extend_from_slice(&chunk);

        let mut crlf = String::new();
        reader.read_line(&mut crlf).ok();
    }

    Ok(body)
}

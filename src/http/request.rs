use std::{collections::HashMap, io};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// The maximum accepted length of the request line and of each header line.
const MAX_LINE_LEN: usize = 8 * 1024;

/// The maximum accepted body length, bodies are read and ignored.
const MAX_BODY_LEN: u64 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Options,
    Other(String),
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        match value {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A parsed HTTP/1.1 request head.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
}

impl Request {
    /// Returns the value of the `name` query parameter, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Reads the next request from `rx`.
///
/// # Returns
/// `None` if the peer closed the connection before sending anything, or an
/// `InvalidData` error if the request is malformed.
pub async fn read<R>(rx: &mut R) -> io::Result<Option<Request>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(line) = read_line(rx).await? else {
        return Ok(None);
    };

    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid(format!("malformed request line {line:?}")));
    };

    if !version.starts_with("HTTP/1.") {
        return Err(invalid(format!("unsupported version {version}")));
    }

    let mut content_len = 0;
    loop {
        let header = read_line(rx)
            .await?
            .ok_or_else(|| invalid("connection closed inside the headers"))?;

        if header.is_empty() {
            break;
        }

        let Some((name, value)) = header.split_once(':') else {
            return Err(invalid(format!("malformed header {header:?}")));
        };

        if name.trim().eq_ignore_ascii_case("content-length") {
            content_len = value
                .trim()
                .parse()
                .map_err(|_| invalid(format!("invalid content length {value:?}")))?;
        }
    }

    if content_len > MAX_BODY_LEN {
        return Err(invalid(format!("body too long ({content_len} bytes)")));
    }

    let mut body = (&mut *rx).take(content_len);
    let discarded = tokio::io::copy(&mut body, &mut tokio::io::sink()).await?;
    if discarded < content_len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (target, HashMap::new()),
    };

    Ok(Some(Request {
        method: Method::from(method),
        path: path.to_string(),
        query,
    }))
}

/// Splits a `k=v&k2=v2` query string. Later repetitions of a key win, keys without a value map
/// to the empty string.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Reads a CRLF (or LF) terminated line without its terminator, `None` on a clean EOF.
async fn read_line<R>(rx: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *rx)
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;

    if n == 0 {
        return Ok(None);
    }

    if n > MAX_LINE_LEN {
        return Err(invalid("line too long"));
    }

    if !buf.ends_with(b"\n") {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }

    buf.pop();
    if buf.ends_with(b"\r") {
        buf.pop();
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| invalid("line is not valid utf-8"))
}

fn invalid<E>(e: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, e)
}

#[cfg(test)]
mod tests {
    use tokio::io::BufReader;

    use super::*;

    async fn parse(raw: &str) -> io::Result<Option<Request>> {
        read(&mut BufReader::new(raw.as_bytes())).await
    }

    #[tokio::test]
    async fn request_line_and_query() {
        let req = parse("POST /train/step?epochs=3&lr=0.01 HTTP/1.1\r\nHost: x\r\n\r\n")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/train/step");
        assert_eq!(req.param("epochs"), Some("3"));
        assert_eq!(req.param("lr"), Some("0.01"));
        assert_eq!(req.param("missing"), None);
    }

    #[tokio::test]
    async fn body_is_skipped() {
        let raw = "POST /reset HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcdGET / HTTP/1.1\r\n\r\n";
        let mut rx = BufReader::new(raw.as_bytes());

        let first = read(&mut rx).await.unwrap().unwrap();
        let second = read(&mut rx).await.unwrap().unwrap();

        assert_eq!(first.path, "/reset");
        assert_eq!(second.method, Method::Get);
        assert_eq!(second.path, "/");
        assert!(read(&mut rx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn eof_before_request() {
        assert!(parse("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_request_line() {
        let err = parse("GARBAGE\r\n\r\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn oversized_body() {
        let err = parse("POST / HTTP/1.1\r\nContent-Length: 999999999\r\n\r\n")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn query_edge_cases() {
        let query = parse_query("a=1&&b&a=2");

        assert_eq!(query.get("a").map(String::as_str), Some("2"));
        assert_eq!(query.get("b").map(String::as_str), Some(""));
        assert_eq!(query.len(), 2);
    }
}

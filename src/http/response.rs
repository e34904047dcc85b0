use serde::Serialize;

/// The status codes the service answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NoContent,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    UnprocessableEntity,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::UnprocessableEntity => 422,
            Self::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NoContent => "No Content",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::UnprocessableEntity => "Unprocessable Entity",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

/// The body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// A response ready to be written, every one of them allows any origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a response serializing `body` as JSON, or a 500 if it can't be serialized.
    pub fn json<T: Serialize>(status: Status, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(body) => Self { status, body },
            Err(e) => {
                log::error!("failed to serialize response: {e}");
                Self::error(Status::InternalServerError, "internal error")
            }
        }
    }

    /// Creates a `{"error": msg}` response.
    pub fn error(status: Status, msg: &str) -> Self {
        let body = serde_json::to_vec(&ErrorBody { error: msg }).unwrap_or_default();
        Self { status, body }
    }

    pub fn empty(status: Status) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    /// Writes the status line, the headers and the body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: *\r\n",
            self.status.code(),
            self.status.reason(),
        );

        if self.status != Status::NoContent {
            head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        if !self.body.is_empty() {
            head.push_str("Content-Type: application/json\r\n");
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

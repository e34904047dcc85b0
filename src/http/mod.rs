//! A minimal HTTP/1.1 front end exposing the [`ModelService`] as JSON endpoints.

mod request;
mod response;
mod routes;

use std::{io, sync::Arc};

use log::{debug, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpListener,
};

use self::response::{Response, Status};
use crate::service::ModelService;

/// Accepts connections forever, serving each one on its own task.
///
/// # Returns
/// Only on a failure to accept.
pub async fn serve(listener: TcpListener, service: Arc<ModelService>) -> io::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        debug!("connection from {addr}");

        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, service).await {
                warn!("connection with {addr} failed: {e}");
            }
        });
    }
}

/// Answers every request sent through `stream` until the peer closes it.
///
/// A malformed request gets a 400 and closes the connection.
pub async fn serve_connection<S>(stream: S, service: Arc<ModelService>) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (rx, mut tx) = tokio::io::split(stream);
    let mut rx = BufReader::new(rx);

    loop {
        let request = match request::read(&mut rx).await {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                debug!("bad request: {e}");
                let res = Response::error(Status::BadRequest, &e.to_string());
                tx.write_all(&res.to_bytes()).await?;
                return tx.shutdown().await;
            }
            Err(e) => return Err(e),
        };

        let res = routes::handle(&service, &request).await;
        debug!(
            method:? = request.method,
            path = request.path.as_str(),
            status = res.status.code();
            "request served"
        );

        tx.write_all(&res.to_bytes()).await?;
        tx.flush().await?;
    }
}

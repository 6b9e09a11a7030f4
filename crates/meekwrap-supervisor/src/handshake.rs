//! Handshake scanner.
//!
//! Reads the helper's stdout line by line until the listen announcement
//! shows up, then keeps draining the stream in the background so the helper
//! never blocks on a full pipe.

use std::io;

use meekwrap_core::HelperAddress;
use meekwrap_core::address::match_listen_line;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, info, trace};

use crate::error::HandshakeError;

/// Longest accepted helper output line, terminator excluded.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Find the helper's listen address in `stream`.
///
/// Returns as soon as the first matching line is read. Fails with
/// [`HandshakeError::AddressNotFound`] if the stream ends first, or with the
/// underlying read error. A line longer than [`MAX_LINE_LEN`] is a read
/// error of kind [`io::ErrorKind::InvalidData`].
pub async fn find_address<R>(stream: R) -> Result<HelperAddress, HandshakeError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let limit = (MAX_LINE_LEN + 1) as u64;
        if (&mut reader).take(limit).read_until(b'\n', &mut buf).await? == 0 {
            return Err(HandshakeError::AddressNotFound);
        }
        if buf.len() > MAX_LINE_LEN && !buf.ends_with(b"\n") {
            return Err(HandshakeError::Read(io::Error::new(
                io::ErrorKind::InvalidData,
                "line too long",
            )));
        }
        let line = String::from_utf8_lossy(strip_line_ending(&buf));
        if let Some(address) = match_listen_line(&line) {
            info!(%address, "browser-helper announced listen address");
            spawn_drain(reader);
            return Ok(address);
        }
        trace!(%line, "browser-helper output");
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Discard everything left in `reader`. Best-effort and detached: nothing
/// waits on it and its failure is only logged.
fn spawn_drain<R>(mut reader: BufReader<R>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match tokio::io::copy_buf(&mut reader, &mut tokio::io::sink()).await {
            Ok(bytes) => debug!(bytes, "browser-helper stdout closed"),
            Err(e) => debug!(error = %e, "browser-helper stdout drain stopped"),
        }
    });
}

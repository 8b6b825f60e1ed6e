//! Reliable send over a transport that may accept partial or empty writes.

use embedded_io::Error as _;
use embedded_io_async::Write;
use log::trace;

use super::HttpError;

/// Write all of `bytes`, retrying the unsent tail until it is delivered.
///
/// A zero-byte write means "try again shortly": the task yields and retries.
/// More than `max_stalls` zero-byte writes in a row abort with
/// [`HttpError::Stalled`]; any transport error aborts with
/// [`HttpError::Send`]. Both report how many bytes already went out.
pub async fn send_all<W: Write>(
    writer: &mut W,
    bytes: &[u8],
    max_stalls: u32,
) -> Result<usize, HttpError> {
    let mut written = 0;
    let mut stalls = 0;

    while written < bytes.len() {
        match writer.write(&bytes[written..]).await {
            Ok(0) => {
                stalls += 1;
                if stalls > max_stalls {
                    return Err(HttpError::Stalled {
                        written,
                        total: bytes.len(),
                    });
                }
                trace!("Zero-byte write at {}/{}, yielding", written, bytes.len());
                embassy_futures::yield_now().await;
            }
            Ok(n) => {
                stalls = 0;
                written += n.min(bytes.len() - written);
            }
            Err(error) => {
                return Err(HttpError::Send {
                    kind: error.kind(),
                    written,
                });
            }
        }
    }

    writer.flush().await.map_err(|error| HttpError::Send {
        kind: error.kind(),
        written,
    })?;
    Ok(written)
}

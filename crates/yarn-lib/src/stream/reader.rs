//! Incremental reads of the connector output file

use crate::error::{Result, YarnError};
use crate::wait::pause;
use std::io::{ErrorKind, SeekFrom};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Copy complete lines written after `cursor` to `out`
///
/// Returns the new cursor. A trailing line without a newline is left
/// unread unless `flush_partial` is set. A missing file reads as zero new
/// bytes, and so does a file that shrank below the cursor: the cursor
/// never moves backwards.
pub async fn read_new_lines<W>(
    path: &Path,
    cursor: u64,
    out: &mut W,
    flush_partial: bool,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(cursor),
        Err(e) => return Err(e.into()),
    };

    let len = file.metadata().await?.len();
    if len < cursor {
        warn!(path = %path.display(), cursor, len, "Output file shrank below read cursor");
        return Ok(cursor);
    }

    file.seek(SeekFrom::Start(cursor)).await?;
    let mut reader = BufReader::new(file);
    let mut position = cursor;
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            break;
        }
        if line.last() != Some(&b'\n') && !flush_partial {
            break;
        }
        out.write_all(&line).await?;
        position += n as u64;
    }
    out.flush().await?;

    if position > cursor {
        debug!(path = %path.display(), bytes = position - cursor, "Relayed output");
    }
    Ok(position)
}

/// Wait until `path` exists, checking every `interval`
///
/// Errors other than absence (e.g. permission denied on a parent) are
/// returned as I/O errors.
pub async fn wait_for_file(
    path: &Path,
    timeout: Duration,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    let started = Instant::now();

    loop {
        if tokio::fs::try_exists(path).await? {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(YarnError::Timeout {
                timeout_secs: timeout.as_secs(),
                path: path.to_path_buf(),
            });
        }
        pause(interval, cancel).await?;
    }
}

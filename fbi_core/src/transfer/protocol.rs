use crate::error::ProtocolError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the big-endian length prefix
pub const LEN_PREFIX_SIZE: usize = 4;

/// Upper bound accepted by [`read_frame`]. Manifests are a few KB at most.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Encode `payload` as a u32 BE length followed by its UTF-8 bytes
pub fn encode_frame(payload: &str) -> Result<Vec<u8>, ProtocolError> {
    let bytes = payload.as_bytes();
    let len = u32::try_from(bytes.len()).map_err(|_| ProtocolError::PayloadTooLarge(bytes.len()))?;

    let mut frame = Vec::with_capacity(LEN_PREFIX_SIZE + bytes.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(bytes);
    Ok(frame)
}

/// Decode one complete frame. Trailing bytes beyond the declared length are ignored.
pub fn decode_frame(frame: &[u8]) -> Result<String, ProtocolError> {
    if frame.len() < LEN_PREFIX_SIZE {
        return Err(ProtocolError::Truncated {
            expected: LEN_PREFIX_SIZE,
            actual: frame.len(),
        });
    }

    let mut len_buf = [0u8; LEN_PREFIX_SIZE];
    len_buf.copy_from_slice(&frame[..LEN_PREFIX_SIZE]);
    let len = u32::from_be_bytes(len_buf) as usize;

    let body = &frame[LEN_PREFIX_SIZE..];
    if body.len() < len {
        return Err(ProtocolError::Truncated {
            expected: len,
            actual: body.len(),
        });
    }

    Ok(String::from_utf8(body[..len].to_vec())?)
}

/// Write a framed payload in a single `write_all` and flush
pub async fn write_frame<W>(writer: &mut W, payload: &str) -> Result<usize, ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(frame.len())
}

/// Read one framed payload, rejecting frames larger than [`MAX_FRAME_SIZE`]
pub async fn read_frame<R>(reader: &mut R) -> Result<String, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; LEN_PREFIX_SIZE];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;

    Ok(String::from_utf8(buf)?)
}

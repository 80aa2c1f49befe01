//! Zabbix 协议帧编解码
//!
//! 帧格式: `"ZBXD"` | flags(1) | data length(4, LE) | reserved(4, LE) | JSON payload

use crate::error::{Result, SenderError};
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const HEADER_MAGIC: &[u8; 4] = b"ZBXD";

pub const FLAG_ZABBIX_PROTOCOL: u8 = 0x01;
pub const FLAG_COMPRESSED: u8 = 0x02;
pub const FLAG_LARGE_PACKET: u8 = 0x04;

pub const HEADER_LEN: usize = 13;

/// 单帧最大数据长度（128 MiB）
pub const MAX_PAYLOAD_LEN: usize = 128 * 1024 * 1024;

/// 编码一帧
pub fn encode_frame(payload: &[u8]) -> Result<Bytes> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(SenderError::Protocol(format!(
            "payload of {} bytes exceeds maximum of {} bytes",
            payload.len(),
            MAX_PAYLOAD_LEN
        )));
    }

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_slice(HEADER_MAGIC);
    buf.put_u8(FLAG_ZABBIX_PROTOCOL);
    buf.put_u32_le(payload.len() as u32);
    buf.put_u32_le(0);
    buf.put_slice(payload);

    Ok(buf.freeze())
}

/// 解析帧头，返回数据长度
pub fn decode_header(header: &[u8; HEADER_LEN]) -> Result<usize> {
    if &header[..4] != HEADER_MAGIC {
        return Err(SenderError::Protocol(format!(
            "invalid header magic {:?}",
            &header[..4]
        )));
    }

    let flags = header[4];
    if flags & FLAG_ZABBIX_PROTOCOL == 0 {
        return Err(SenderError::Protocol(format!("invalid header flags {:#04x}", flags)));
    }
    if flags & (FLAG_COMPRESSED | FLAG_LARGE_PACKET) != 0 {
        return Err(SenderError::Protocol(format!(
            "unsupported header flags {:#04x}",
            flags
        )));
    }

    let len = u32::from_le_bytes([header[5], header[6], header[7], header[8]]) as usize;
    if len > MAX_PAYLOAD_LEN {
        return Err(SenderError::Protocol(format!(
            "declared length {} exceeds maximum of {} bytes",
            len, MAX_PAYLOAD_LEN
        )));
    }

    Ok(len)
}

/// 写入一帧
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// 读取一帧，返回 JSON payload
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            SenderError::Protocol("connection closed before full header was received".to_string())
        } else {
            SenderError::Io(e)
        }
    })?;

    let len = decode_header(&header)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(payload)
}

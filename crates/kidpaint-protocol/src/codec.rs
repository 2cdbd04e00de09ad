//! Codec trait and the binary framing for the KidPaint message catalog.
//!
//! Wire format (length-implicit, everything big-endian):
//!
//! ```text
//! [tag:1][fields...]
//!   i32    → 4 bytes, big-endian
//!   bool   → 1 byte, 0 = false, anything else = true
//!   string → [len:u16][len bytes of UTF-8]
//!   list   → [count:i32][count items]
//! ```
//!
//! There is no outer length prefix, so a decoder can only tell a message
//! is complete by parsing it. [`Codec::decode`] therefore returns
//! `Ok(None)` when the buffer holds a valid-so-far prefix and more bytes
//! are needed, and [`FrameReader`] uses that to drive a streaming read
//! loop over any `AsyncRead`.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::types::tag;
use crate::{ClientMessage, LobbyEntry, Point, ProtocolError, ServerMessage, Sketch};

/// Largest pixel batch a peer may send in one message.
pub const MAX_BATCH_POINTS: usize = 1 << 20;

/// Largest canvas edge length accepted in a `FullSketch`.
pub const MAX_SKETCH_SIZE: usize = 4096;

/// Largest lobby or leaderboard list accepted.
pub const MAX_LIST_ENTRIES: usize = 1 << 16;

const READ_CHUNK: usize = 4096;

/// Converts a message to bytes and back.
///
/// `decode` is incremental: it never consumes a partial message.
/// - `Ok(Some((msg, used)))` → one complete message spanning `used` bytes
/// - `Ok(None)` → the buffer is a prefix of a valid message; read more
/// - `Err(_)` → the bytes can never become a valid message
pub trait Codec: Sized {
    /// Appends the encoded message to `buf`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::StringTooLong`] or
    /// [`ProtocolError::InvalidMessage`] if a field can't be represented.
    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), ProtocolError>;

    /// Encodes the message into a fresh buffer.
    fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Attempts to decode one message from the front of `buf`.
    fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, ProtocolError>;
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn put_bool(buf: &mut Vec<u8>, value: bool) {
    buf.push(u8::from(value));
}

fn put_str(buf: &mut Vec<u8>, value: &str) -> Result<(), ProtocolError> {
    let len = u16::try_from(value.len())
        .map_err(|_| ProtocolError::StringTooLong(value.len()))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

fn put_count(buf: &mut Vec<u8>, count: usize, what: &str) -> Result<(), ProtocolError> {
    let count = i32::try_from(count).map_err(|_| {
        ProtocolError::InvalidMessage(format!("too many {what} entries: {count}"))
    })?;
    put_i32(buf, count);
    Ok(())
}

fn put_points(buf: &mut Vec<u8>, color: i32, points: &[Point]) -> Result<(), ProtocolError> {
    put_i32(buf, color);
    put_count(buf, points.len(), "point")?;
    buf.reserve(points.len() * 8);
    for p in points {
        put_i32(buf, p.x);
        put_i32(buf, p.y);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding helpers
// ---------------------------------------------------------------------------

/// Why a parse attempt stopped.
enum Step {
    /// Ran out of bytes; the message may still complete.
    Incomplete,
    /// The bytes are wrong and no amount of reading will fix them.
    Invalid(ProtocolError),
}

impl From<ProtocolError> for Step {
    fn from(e: ProtocolError) -> Self {
        Step::Invalid(e)
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Step> {
        let end = self.pos.checked_add(n).ok_or(Step::Incomplete)?;
        let bytes = self.buf.get(self.pos..end).ok_or(Step::Incomplete)?;
        self.pos = end;
        Ok(bytes)
    }

    /// Fails fast with `Incomplete` when `n` more bytes aren't buffered
    /// yet, so large bodies aren't re-parsed item by item on every read.
    fn require(&self, n: usize) -> Result<(), Step> {
        if self.remaining() < n {
            Err(Step::Incomplete)
        } else {
            Ok(())
        }
    }

    fn u8(&mut self) -> Result<u8, Step> {
        Ok(self.take(1)?[0])
    }

    fn i32(&mut self) -> Result<i32, Step> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn bool(&mut self) -> Result<bool, Step> {
        Ok(self.u8()? != 0)
    }

    fn string(&mut self) -> Result<String, Step> {
        let b = self.take(2)?;
        let len = u16::from_be_bytes([b[0], b[1]]) as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            Step::Invalid(ProtocolError::InvalidMessage(format!(
                "string is not valid UTF-8: {e}"
            )))
        })
    }

    fn count(&mut self, what: &str, max: usize) -> Result<usize, Step> {
        let raw = self.i32()?;
        let count = usize::try_from(raw).map_err(|_| {
            ProtocolError::InvalidMessage(format!("negative {what} count: {raw}"))
        })?;
        if count > max {
            return Err(ProtocolError::InvalidMessage(format!(
                "{what} count {count} exceeds limit {max}"
            ))
            .into());
        }
        Ok(count)
    }

    fn points(&mut self) -> Result<(i32, Vec<Point>), Step> {
        let color = self.i32()?;
        let count = self.count("point", MAX_BATCH_POINTS)?;
        self.require(count * 8)?;
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            let x = self.i32()?;
            let y = self.i32()?;
            points.push(Point::new(x, y));
        }
        Ok((color, points))
    }
}

fn run<T>(
    buf: &[u8],
    parse: impl FnOnce(&mut Cursor<'_>) -> Result<T, Step>,
) -> Result<Option<(T, usize)>, ProtocolError> {
    let mut cursor = Cursor { buf, pos: 0 };
    match parse(&mut cursor) {
        Ok(value) => Ok(Some((value, cursor.pos))),
        Err(Step::Incomplete) => Ok(None),
        Err(Step::Invalid(e)) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

impl Codec for ClientMessage {
    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), ProtocolError> {
        buf.push(self.tag());
        match self {
            Self::Name { name } => put_str(buf, name),
            Self::PixelBatch { color, points } => put_points(buf, *color, points),
            Self::Chat { text } => put_str(buf, text),
            Self::Whisper { target, message } => {
                put_str(buf, target)?;
                put_str(buf, message)
            }
            Self::Clear | Self::ClientReady | Self::HostStart => Ok(()),
        }
    }

    fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, ProtocolError> {
        run(buf, |cur| {
            let tag = cur.u8()?;
            match tag {
                tag::NAME => Ok(Self::Name { name: cur.string()? }),
                tag::PIXELS => {
                    let (color, points) = cur.points()?;
                    Ok(Self::PixelBatch { color, points })
                }
                tag::CHAT => Ok(Self::Chat { text: cur.string()? }),
                tag::CLEAR => Ok(Self::Clear),
                tag::WHISPER => {
                    let target = cur.string()?;
                    let message = cur.string()?;
                    Ok(Self::Whisper { target, message })
                }
                tag::CLIENT_READY => Ok(Self::ClientReady),
                tag::HOST_START => Ok(Self::HostStart),
                tag::FULL_SKETCH
                | tag::GAME_OVER
                | tag::LOBBY_UPDATE
                | tag::GAME_STATE
                | tag::YOUR_TURN
                | tag::LEADERBOARD
                | tag::MODE => Err(ProtocolError::WrongDirection(tag).into()),
                other => Err(ProtocolError::UnknownTag(other).into()),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

impl Codec for ServerMessage {
    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), ProtocolError> {
        buf.push(self.tag());
        match self {
            Self::PixelBatch { color, points } => put_points(buf, *color, points),
            Self::Chat { text } => put_str(buf, text),
            Self::FullSketch(sketch) => {
                let expected = sketch.size * sketch.size;
                if sketch.cells.len() != expected {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "sketch of size {} has {} cells, expected {expected}",
                        sketch.size,
                        sketch.cells.len()
                    )));
                }
                put_count(buf, sketch.size, "sketch size")?;
                buf.reserve(expected * 4);
                for cell in &sketch.cells {
                    put_i32(buf, *cell);
                }
                Ok(())
            }
            Self::Clear | Self::GameOver => Ok(()),
            Self::LobbyUpdate { entries } => {
                put_count(buf, entries.len(), "lobby")?;
                for entry in entries {
                    put_str(buf, &entry.name)?;
                    put_bool(buf, entry.ready);
                }
                Ok(())
            }
            Self::GameState { drawer, time } => {
                put_str(buf, drawer)?;
                put_i32(buf, *time);
                Ok(())
            }
            Self::YourTurn { is_turn, word } => {
                put_bool(buf, *is_turn);
                put_str(buf, word)
            }
            Self::Leaderboard { entries } => {
                put_count(buf, entries.len(), "leaderboard")?;
                for entry in entries {
                    put_str(buf, entry)?;
                }
                Ok(())
            }
            Self::Mode { draw_and_guess } => {
                put_bool(buf, *draw_and_guess);
                Ok(())
            }
        }
    }

    fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, ProtocolError> {
        run(buf, |cur| {
            let tag = cur.u8()?;
            match tag {
                tag::PIXELS => {
                    let (color, points) = cur.points()?;
                    Ok(Self::PixelBatch { color, points })
                }
                tag::CHAT => Ok(Self::Chat { text: cur.string()? }),
                tag::FULL_SKETCH => {
                    let size = cur.count("sketch size", MAX_SKETCH_SIZE)?;
                    let n = size * size;
                    cur.require(n * 4)?;
                    let mut cells = Vec::with_capacity(n);
                    for _ in 0..n {
                        cells.push(cur.i32()?);
                    }
                    Ok(Self::FullSketch(Sketch { size, cells }))
                }
                tag::CLEAR => Ok(Self::Clear),
                tag::GAME_OVER => Ok(Self::GameOver),
                tag::LOBBY_UPDATE => {
                    let count = cur.count("lobby", MAX_LIST_ENTRIES)?;
                    let mut entries = Vec::with_capacity(count.min(64));
                    for _ in 0..count {
                        let name = cur.string()?;
                        let ready = cur.bool()?;
                        entries.push(LobbyEntry { name, ready });
                    }
                    Ok(Self::LobbyUpdate { entries })
                }
                tag::GAME_STATE => {
                    let drawer = cur.string()?;
                    let time = cur.i32()?;
                    Ok(Self::GameState { drawer, time })
                }
                tag::YOUR_TURN => {
                    let is_turn = cur.bool()?;
                    let word = cur.string()?;
                    Ok(Self::YourTurn { is_turn, word })
                }
                tag::LEADERBOARD => {
                    let count = cur.count("leaderboard", MAX_LIST_ENTRIES)?;
                    let mut entries = Vec::with_capacity(count.min(64));
                    for _ in 0..count {
                        entries.push(cur.string()?);
                    }
                    Ok(Self::Leaderboard { entries })
                }
                tag::MODE => Ok(Self::Mode {
                    draw_and_guess: cur.bool()?,
                }),
                tag::NAME | tag::WHISPER | tag::CLIENT_READY | tag::HOST_START => {
                    Err(ProtocolError::WrongDirection(tag).into())
                }
                other => Err(ProtocolError::UnknownTag(other).into()),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// FrameReader
// ---------------------------------------------------------------------------

/// Pulls whole messages off an `AsyncRead` byte stream.
///
/// Bytes that arrive past the end of one message stay buffered for the
/// next call, so one TCP segment carrying several messages (or one message
/// split across segments) both work.
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Reads the next complete message.
    ///
    /// Returns `Ok(None)` on a clean end of stream (EOF on a message
    /// boundary).
    ///
    /// # Errors
    /// - [`ProtocolError::Truncated`] if the stream ends mid-message
    /// - any decode error from [`Codec::decode`]
    /// - [`ProtocolError::Io`] if the read itself fails
    pub async fn next_message<M: Codec>(&mut self) -> Result<Option<M>, ProtocolError> {
        loop {
            if let Some((msg, used)) = M::decode(&self.buf)? {
                self.buf.drain(..used);
                return Ok(Some(msg));
            }

            self.buf.reserve(READ_CHUNK);
            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(ProtocolError::Truncated {
                    buffered: self.buf.len(),
                });
            }
            tracing::trace!(bytes = n, buffered = self.buf.len(), "read chunk");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

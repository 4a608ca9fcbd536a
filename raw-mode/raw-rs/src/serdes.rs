use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::raw_hal::{RawError, SerdesError};

use crate::encoder::RawFrame;

// Large enough for a full frame of 19 varint words, the mask and COBS overhead
pub const FRAME_BUFFER_SIZE: usize = 128;

pub fn serialize_frame(frame: &RawFrame, buffer: &mut [u8]) -> Result<usize, RawError> {
    Ok(serialize_postcard(frame, buffer)?)
}

/// COBS framed, so the output contains no zero bytes except the trailing
/// delimiter.
pub fn serialize_frame_cobs(frame: &RawFrame, buffer: &mut [u8]) -> Result<usize, RawError> {
    match postcard::to_slice_cobs(frame, buffer) {
        Ok(output) => Ok(output.len()),
        Err(err) => Err(postcard_err_to_serdes_err(err).into()),
    }
}

pub fn deserialize_frame(buffer: &[u8]) -> Result<RawFrame, RawError> {
    Ok(deserialize_postcard(buffer)?)
}

/// Decodes in place, `buffer` is clobbered.
pub fn deserialize_frame_cobs(buffer: &mut [u8]) -> Result<RawFrame, RawError> {
    from_bytes_cobs(buffer).map_err(RawError::Serialization)
}

pub fn serialize_postcard<T>(value: &T, buffer: &mut [u8]) -> Result<usize, SerdesError>
where
    T: Serialize,
{
    match postcard::to_slice(value, buffer) {
        Ok(buffer) => Ok(buffer.len()),
        Err(err) => Err(postcard_err_to_serdes_err(err)),
    }
}

pub fn deserialize_postcard<'a, T>(buffer: &'a [u8]) -> Result<T, SerdesError>
where
    T: Deserialize<'a>,
{
    match postcard::from_bytes(buffer) {
        Ok(value) => Ok(value),
        Err(err) => Err(postcard_err_to_serdes_err(err)),
    }
}

fn from_bytes_cobs<T>(buffer: &mut [u8]) -> Result<T, SerdesError>
where
    T: DeserializeOwned,
{
    postcard::from_bytes_cobs(buffer).map_err(postcard_err_to_serdes_err)
}

fn postcard_err_to_serdes_err(err: postcard::Error) -> SerdesError {
    match err {
        postcard::Error::WontImplement
        | postcard::Error::NotYetImplemented
        | postcard::Error::SerializeSeqLengthUnknown => SerdesError::PostcardImplementation,
        postcard::Error::SerializeBufferFull => SerdesError::PacketTooLong,
        postcard::Error::SerdeSerCustom | postcard::Error::SerdeDeCustom => SerdesError::SerdeError,
        postcard::Error::DeserializeUnexpectedEnd => SerdesError::UnexpectedEnd,
        postcard::Error::DeserializeBadVarint
        | postcard::Error::DeserializeBadBool
        | postcard::Error::DeserializeBadChar
        | postcard::Error::DeserializeBadUtf8
        | postcard::Error::DeserializeBadOption
        | postcard::Error::DeserializeBadEnum => SerdesError::BadVar,
        postcard::Error::DeserializeBadEncoding => SerdesError::BadEncoding,
        _ => SerdesError::Unknown,
    }
}

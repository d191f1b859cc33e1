// String-mediated scalar readers: numeric and boolean columns arrive as quoted text.
use crate::core::error::{Error, Representation};
use crate::core::token::TokenCursor;

/// Reads a nullable string token; `None` means the token was JSON null.
pub fn read_string(cursor: &mut dyn TokenCursor) -> Result<Option<String>, Error> {
    Ok(cursor.string_or_null()?.map(|text| text.into_owned()))
}

/// Reads a quoted base-10 signed integer.
pub fn read_int(cursor: &mut dyn TokenCursor) -> Result<Option<i64>, Error> {
    let Some(text) = cursor.string_or_null()? else {
        return Ok(None);
    };
    text.parse::<i64>()
        .map(Some)
        .map_err(|err| Error::malformed(Representation::Int, &*text).with_source(err))
}

/// Reads a quoted 64-bit float.
pub fn read_float(cursor: &mut dyn TokenCursor) -> Result<Option<f64>, Error> {
    let Some(text) = cursor.string_or_null()? else {
        return Ok(None);
    };
    text.parse::<f64>()
        .map(Some)
        .map_err(|err| Error::malformed(Representation::Float, &*text).with_source(err))
}

/// Reads a quoted boolean; only the exact texts `true` and `false` are accepted.
pub fn read_bool(cursor: &mut dyn TokenCursor) -> Result<Option<bool>, Error> {
    let Some(text) = cursor.string_or_null()? else {
        return Ok(None);
    };
    text.parse::<bool>()
        .map(Some)
        .map_err(|err| Error::malformed(Representation::Bool, &*text).with_source(err))
}

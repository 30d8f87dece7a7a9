// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for city model reading
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a city model document
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a city model: {0}")]
    NotCityModel(String),
}

use crate::model::{Id, ModelValidationError};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image: String,
    pub age: Option<u32>,
    pub phone: Option<String>,
    pub birth_date: Option<BirthDate>,
}

impl UserProfile {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The username is empty")]
pub struct InvalidUsernameError;

impl Username {
    pub fn new(username: String) -> Result<Self, InvalidUsernameError> {
        if username.is_empty() {
            Err(InvalidUsernameError)
        } else {
            Ok(Username(username))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Username::new(inner).map_err(|err| Error::custom(ModelValidationError::from(err)))
    }
}

/// Calendar birth date as the directory reports it: `YYYY-M-D`, month and day not necessarily
/// zero-padded.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct BirthDate(Date);

impl Default for BirthDate {
    fn default() -> Self {
        Self(Date::MIN)
    }
}

const BIRTH_DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month padding:none]-[day padding:none]");

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The birth date is invalid: {0}")]
pub struct InvalidBirthDateError(String);

impl BirthDate {
    #[must_use]
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    #[must_use]
    pub fn get(self) -> Date {
        self.0
    }
}

impl FromStr for BirthDate {
    type Err = InvalidBirthDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s.trim(), BIRTH_DATE_FORMAT)
            .map(Self)
            .map_err(|_| InvalidBirthDateError(s.to_owned()))
    }
}

impl Display for BirthDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (year, month, day) = self.0.to_calendar_date();
        write!(f, "{year}-{}-{day}", u8::from(month))
    }
}

impl Serialize for BirthDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BirthDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        BirthDate::from_str(&inner).map_err(|err| Error::custom(ModelValidationError::from(err)))
    }
}

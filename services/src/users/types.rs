//! Request schemas, validation, and the error taxonomy for the user resource.
//!
//! Every operation has an explicit typed input that is validated into
//! [`UserFields`] before the store is touched, so a request either fully
//! succeeds or leaves the store unchanged.

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Deserializer, Serialize};

use super::storage::{Gender, User, UserFields};

/// Error taxonomy for the user resource.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// A query parameter was present but malformed.
    #[error("invalid limit parameter: {0:?}")]
    InvalidParameter(String),

    /// Required body fields were missing, empty, or null.
    #[error("missing required fields: {0}")]
    MissingFields(String),

    /// Gender was present but not one of the enumerated values.
    #[error("invalid gender, must be Male, Female, or Other")]
    InvalidGender,

    /// Age was present but not a non-negative number.
    #[error("age must be a non-negative number")]
    InvalidAge,

    /// The request body could not be deserialized into the operation's
    /// schema.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// No record has the given id.
    #[error("user not found: {0}")]
    NotFound(String),

    /// An unexpected store failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body for API endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<UserError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: UserError) -> Self {
        let (status, error_type) = match &err {
            UserError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "invalid_parameter"),
            UserError::MissingFields(_) => (StatusCode::BAD_REQUEST, "missing_fields"),
            UserError::InvalidGender => (StatusCode::BAD_REQUEST, "invalid_gender"),
            UserError::InvalidAge => (StatusCode::BAD_REQUEST, "invalid_age"),
            UserError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "invalid_body"),
            UserError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            UserError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_type.to_owned(),
                message: err.to_string(),
            }),
        )
    }
}

/// Query parameters for the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    /// Raw `limit` value; parsed by [`ListUsersQuery::parse_limit`] so a
    /// malformed value maps to the resource's own error body rather than an
    /// extractor rejection.
    pub limit: Option<String>,
}

impl ListUsersQuery {
    /// Parses `limit` into a positive count.
    ///
    /// Absent means "no limit". Anything present that is not a positive
    /// integer, including `0`, is `InvalidParameter`.
    pub fn parse_limit(&self) -> Result<Option<usize>, UserError> {
        match self.limit.as_deref() {
            None => Ok(None),
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Some(n)),
                _ => Err(UserError::InvalidParameter(raw.to_owned())),
            },
        }
    }
}

/// Body for create and replace, which share full validation: all six scalar
/// fields are required, `hobbyList` defaults to empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    /// Raw JSON value so a wrong-typed or fractional age is judged by the
    /// validation step, not the extractor.
    pub age: Option<serde_json::Value>,
    pub birth_place: Option<String>,
    pub country: Option<String>,
    pub hobby_list: Option<Vec<String>>,
}

impl UpsertUserRequest {
    /// Validates the body into store-ready fields.
    ///
    /// Check order follows the resource contract: required-field presence,
    /// then gender, then age.
    pub fn validate(self) -> Result<UserFields, UserError> {
        let Self {
            first_name,
            last_name,
            gender,
            age,
            birth_place,
            country,
            hobby_list,
        } = self;

        let mut missing = Vec::new();
        if !is_present(&first_name) {
            missing.push("firstName");
        }
        if !is_present(&last_name) {
            missing.push("lastName");
        }
        if !is_present(&gender) {
            missing.push("gender");
        }
        if age.is_none() {
            missing.push("age");
        }
        if !is_present(&birth_place) {
            missing.push("birthPlace");
        }
        if !is_present(&country) {
            missing.push("country");
        }
        if !missing.is_empty() {
            return Err(UserError::MissingFields(missing.join(", ")));
        }

        let gender = parse_gender(gender.as_deref().unwrap_or_default())
            .ok_or(UserError::InvalidGender)?;
        let age = non_negative_age(&age.unwrap_or_default())?;

        Ok(UserFields {
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            gender,
            age,
            birth_place: birth_place.unwrap_or_default(),
            country: country.unwrap_or_default(),
            hobby_list: hobby_list.unwrap_or_default(),
        })
    }
}

/// Body for partial updates.
///
/// Each field distinguishes "absent" (outer `None`) from an explicit JSON
/// `null` (inner `None`). No field is nullable, so explicit nulls are
/// rejected during validation instead of silently clearing data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchUserRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub age: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birth_place: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub hobby_list: Option<Option<Vec<String>>>,
}

impl PatchUserRequest {
    /// Validates the patch against the stored record and produces the merged
    /// fields. Fields absent from the input keep their stored value; gender
    /// and age are validated only when present.
    pub fn apply_to(self, user: &User) -> Result<UserFields, UserError> {
        let Self {
            first_name,
            last_name,
            gender,
            age,
            birth_place,
            country,
            hobby_list,
        } = self;

        let gender = match gender {
            None => user.gender,
            Some(None) => return Err(UserError::InvalidGender),
            Some(Some(raw)) => parse_gender(&raw).ok_or(UserError::InvalidGender)?,
        };
        let age = match age {
            None => user.age,
            Some(None) => return Err(UserError::InvalidAge),
            Some(Some(n)) => non_negative_age(&n)?,
        };

        let first_name = merge_text("firstName", first_name, &user.first_name)?;
        let last_name = merge_text("lastName", last_name, &user.last_name)?;
        let birth_place = merge_text("birthPlace", birth_place, &user.birth_place)?;
        let country = merge_text("country", country, &user.country)?;

        let hobby_list = match hobby_list {
            None => user.hobby_list.clone(),
            Some(None) => return Err(UserError::MissingFields("hobbyList".to_owned())),
            Some(Some(list)) => list,
        };

        Ok(UserFields {
            first_name,
            last_name,
            gender,
            age,
            birth_place,
            country,
            hobby_list,
        })
    }
}

/// Maps a wire gender string onto the closed enum.
pub fn parse_gender(raw: &str) -> Option<Gender> {
    match raw {
        "Male" => Some(Gender::Male),
        "Female" => Some(Gender::Female),
        "Other" => Some(Gender::Other),
        _ => None,
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Ages are any non-negative JSON number, fractional included. Anything
/// else present under the key, strings and booleans included, is
/// `InvalidAge`.
fn non_negative_age(age: &serde_json::Value) -> Result<f64, UserError> {
    match age.as_f64() {
        Some(n) if n >= 0.0 => Ok(n),
        _ => Err(UserError::InvalidAge),
    }
}

fn merge_text(
    field: &str,
    patch: Option<Option<String>>,
    current: &str,
) -> Result<String, UserError> {
    match patch {
        None => Ok(current.to_owned()),
        // Null means the caller sent the field without a usable value.
        Some(None) => Err(UserError::MissingFields(field.to_owned())),
        Some(Some(value)) => Ok(value),
    }
}

/// Deserializes a field so that "absent" and "explicitly null" stay
/// distinguishable: this only runs when the key is present, wrapping the
/// (possibly null) value in the outer `Some`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

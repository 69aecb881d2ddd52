// Request body validation for book records
//
// Shape is checked by serde (required fields, JSON types, unknown fields),
// content by the `Validate` rules below. Every rule runs so a client sees
// all violations at once.

use crate::errors::ValidationError;
use crate::models::{Book, BookPayload};
use chrono::{Datelike, Utc};
use serde::de::DeserializeOwned;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Deserialize and validate the body of a create request
///
/// The returned book carries the normalized ISBN.
pub fn parse_book(value: serde_json::Value) -> Result<Book, ValidationError> {
    let mut book: Book = parse(value)?;
    book.isbn = normalize_isbn(&book.isbn);
    Ok(book)
}

/// Deserialize and validate the body of an update request
pub fn parse_payload(value: serde_json::Value) -> Result<BookPayload, ValidationError> {
    parse(value)
}

fn parse<T: DeserializeOwned + Validate>(value: serde_json::Value) -> Result<T, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::InvalidJson(
            "request body must be a JSON object".to_string(),
        ));
    }
    let parsed: T = serde_json::from_value(value)?;
    parsed.validate()?;
    Ok(parsed)
}

pub fn validate_not_blank(field_name: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, "must not be blank"));
    }
    Ok(())
}

/// Canonical storage form of an ISBN: hyphens dropped, check digit `X` upper-cased
///
/// Path lookups go through this too, so every spelling of an ISBN maps to one row.
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.trim()
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// ISBN-10 or ISBN-13, optionally hyphenated; ISBN-10 may end in `X`
pub fn validate_isbn(field_name: &str, isbn: &str) -> Result<(), ValidationError> {
    let compact: Vec<char> = isbn.chars().filter(|c| *c != '-').collect();

    if compact.is_empty() {
        return Err(invalid(field_name, "must not be blank"));
    }

    let (body, last) = compact.split_at(compact.len() - 1);
    let last_ok = last[0].is_ascii_digit() || (compact.len() == 10 && matches!(last[0], 'X' | 'x'));
    if !body.iter().all(|c| c.is_ascii_digit()) || !last_ok {
        return Err(invalid(
            field_name,
            "may only contain digits, hyphens and a trailing X",
        ));
    }

    match compact.len() {
        10 | 13 => Ok(()),
        n => Err(invalid(
            field_name,
            &format!("must have 10 or 13 digits, found {}", n),
        )),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<(), ValidationError> {
    if url_str.trim().is_empty() {
        return Err(invalid(field_name, "must not be blank"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                &format!("unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, &format!("invalid URL format: {}", e))),
    }
}

pub fn validate_min(field_name: &str, value: i32, min_value: i32) -> Result<(), ValidationError> {
    if value < min_value {
        return Err(invalid(
            field_name,
            &format!("must be at least {}", min_value),
        ));
    }
    Ok(())
}

/// Publication year, allowing announced titles one year ahead
pub fn validate_year(field_name: &str, year: i32) -> Result<(), ValidationError> {
    let max_year = Utc::now().year() + 1;
    if !(0..=max_year).contains(&year) {
        return Err(invalid(
            field_name,
            &format!("must be between 0 and {}", max_year),
        ));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFieldValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn collect(checks: Vec<Result<(), ValidationError>>) -> Result<(), ValidationError> {
    let errors: Vec<String> = checks
        .into_iter()
        .filter_map(|check| check.err())
        .map(|err| err.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::SchemaValidationFailed(errors))
    }
}

fn payload_checks(payload: &BookPayload) -> Vec<Result<(), ValidationError>> {
    vec![
        validate_url("amazon_url", &payload.amazon_url),
        validate_not_blank("author", &payload.author),
        validate_not_blank("language", &payload.language),
        validate_min("pages", payload.pages, 1),
        validate_not_blank("publisher", &payload.publisher),
        validate_not_blank("title", &payload.title),
        validate_year("year", payload.year),
    ]
}

impl Validate for BookPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        collect(payload_checks(self))
    }
}

impl Validate for Book {
    fn validate(&self) -> Result<(), ValidationError> {
        let (isbn, payload) = self.clone().into_parts();
        let mut checks = vec![validate_isbn("isbn", &isbn)];
        checks.extend(payload_checks(&payload));
        collect(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> serde_json::Value {
        json!({
            "isbn": "0691161518",
            "amazon_url": "http://a.co/eobPtX2",
            "author": "Matthew Lane",
            "language": "english",
            "pages": 264,
            "publisher": "Princeton University Press",
            "title": "Power-Up: Unlocking the Hidden Mathematics in Video Games",
            "year": 2017
        })
    }

    #[test]
    fn test_valid_book_parses() {
        let book = parse_book(valid_body()).unwrap();
        assert_eq!(book.isbn, "0691161518");
        assert_eq!(book.pages, 264);
    }

    #[test]
    fn test_missing_year_is_rejected() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("year");
        assert_eq!(
            parse_book(body).unwrap_err(),
            ValidationError::MissingField("year".to_string())
        );
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut body = valid_body();
        body["pages"] = json!("264");
        assert!(matches!(
            parse_book(body),
            Err(ValidationError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut body = valid_body();
        body["rating"] = json!(5);
        assert!(parse_book(body).is_err());
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        assert!(matches!(
            parse_book(json!([1, 2, 3])),
            Err(ValidationError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_all_violations_are_reported() {
        let mut body = valid_body();
        body["pages"] = json!(0);
        body["title"] = json!("   ");
        body["amazon_url"] = json!("not a url");

        let err = parse_book(body).unwrap_err();
        let messages = err.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().any(|m| m.contains("pages")));
        assert!(messages.iter().any(|m| m.contains("title")));
        assert!(messages.iter().any(|m| m.contains("amazon_url")));
    }

    #[test]
    fn test_isbn_formats() {
        assert!(validate_isbn("isbn", "0691161518").is_ok());
        assert!(validate_isbn("isbn", "978-0-691-16151-7").is_ok());
        assert!(validate_isbn("isbn", "080442957X").is_ok());
        assert!(validate_isbn("isbn", "999").is_err());
        assert!(validate_isbn("isbn", "97806911615X7").is_err());
        assert!(validate_isbn("isbn", "abcdefghij").is_err());
        assert!(validate_isbn("isbn", "---").is_err());
    }

    #[test]
    fn test_hyphenated_isbn_is_stored_compact() {
        let mut body = valid_body();
        body["isbn"] = json!("0-691-16151-8");
        assert_eq!(parse_book(body).unwrap().isbn, "0691161518");
    }

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("978-0-691-16151-7"), "9780691161517");
        assert_eq!(normalize_isbn("0-8044-2957-x"), "080442957X");
        assert_eq!(normalize_isbn("999"), "999");
    }

    #[test]
    fn test_url_scheme_must_be_http() {
        assert!(validate_url("amazon_url", "https://www.amazon.com/dp/0691161518").is_ok());
        assert!(validate_url("amazon_url", "ftp://a.co/eobPtX2").is_err());
        assert!(validate_url("amazon_url", "").is_err());
    }

    #[test]
    fn test_year_bounds() {
        let next_year = Utc::now().year() + 1;
        assert!(validate_year("year", 2017).is_ok());
        assert!(validate_year("year", next_year).is_ok());
        assert!(validate_year("year", next_year + 1).is_err());
        assert!(validate_year("year", -1).is_err());
    }

    #[test]
    fn test_payload_does_not_require_isbn() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("isbn");
        let payload = parse_payload(body).unwrap();
        assert_eq!(payload.title, "Power-Up: Unlocking the Hidden Mathematics in Video Games");
    }
}

use super::{Record, RecordStore};
use crate::prelude::AppError;
use reqwest::StatusCode;
use reqwest::blocking::{self, Response};
use reqwest::header::{CONTENT_TYPE, HeaderName, IF_MATCH, IF_NONE_MATCH};
use tracing::{debug, warn};
use url::Url;

/// Cloud-document backend: one JSON document per location behind
/// `{base_url}/{location}`.
///
/// Existence semantics are left to the server's conditional writes, so
/// `create` and `update` are atomic as far as the document store honours
/// `If-None-Match` and `If-Match`.
pub struct RemoteStorage {
    pub medium: String,
    pub base_url: Url,
    api_key: Option<String>,
    client: blocking::Client,
}

impl RemoteStorage {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "'{}' cannot be used as a base url",
                base_url
            )));
        }

        Ok(Self {
            medium: "remote".to_string(),
            base_url,
            api_key,
            client: blocking::Client::new(),
        })
    }

    /// Formats the document url for `location`, appending the API key as a
    /// query parameter when one is configured.
    ///
    /// Each `/`-separated part of the location becomes one percent-encoded
    /// path segment under the base url, so `#` and `?` stay part of the
    /// document name and `.`/`..` are refused.
    pub fn document_url(&self, location: &str) -> Result<Url, AppError> {
        let location = location.trim_start_matches('/');
        if location.is_empty() {
            return Err(AppError::Validation("Location must not be empty".to_string()));
        }

        let segments: Vec<&str> = location.split('/').collect();
        if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
            return Err(AppError::Validation(format!(
                "Location '{}' must be a relative path under the remote base url",
                location
            )));
        }

        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Validation(format!("'{}' cannot be used as a base url", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("apiKey", key);
        }
        Ok(url)
    }

    fn put(
        &self,
        location: &str,
        record: &Record,
        precondition: HeaderName,
    ) -> Result<Response, AppError> {
        let url = self.document_url(location)?;

        let res = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/json")
            .header(precondition, "*")
            .body(serde_json::to_vec(record)?)
            .send()?;
        Ok(res)
    }
}

impl RecordStore for RemoteStorage {
    fn create(&self, location: &str, record: Record) -> Result<(), AppError> {
        let res = self.put(location, &record, IF_NONE_MATCH)?;

        match res.status() {
            StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT => {
                Err(AppError::AlreadyExists("Document".to_string()))
            }
            _ => {
                res.error_for_status()?;
                debug!(location, "remote: document created");
                Ok(())
            }
        }
    }

    fn read(&self, location: &str) -> Result<Record, AppError> {
        let url = self.document_url(location)?;
        let res = self.client.get(url).send()?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Document".to_string()));
        }

        // Convert non-success status into a `reqwest::Error` which maps to `AppError::FailedRequest`
        let body = res.error_for_status()?.text()?;

        serde_json::from_str::<Record>(&body).map_err(|e| {
            warn!(location, error = %e, "remote: document body is not a json object");
            AppError::CorruptRecord(format!("{}: {}", location, e))
        })
    }

    fn update(&self, location: &str, record: Record) -> Result<(), AppError> {
        let res = self.put(location, &record, IF_MATCH)?;

        match res.status() {
            StatusCode::PRECONDITION_FAILED | StatusCode::NOT_FOUND => {
                Err(AppError::NotFound("Document".to_string()))
            }
            _ => {
                res.error_for_status()?;
                debug!(location, "remote: document replaced");
                Ok(())
            }
        }
    }

    fn delete(&self, location: &str) -> Result<(), AppError> {
        let url = self.document_url(location)?;
        let res = self.client.delete(url).send()?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Document".to_string()));
        }

        res.error_for_status()?;
        debug!(location, "remote: document removed");
        Ok(())
    }

    fn get_medium(&self) -> &str {
        &self.medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, mock, server_url};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("test record must be a json object"),
        }
    }

    #[test]
    fn document_url_joins_location_and_api_key() -> Result<(), AppError> {
        let storage = RemoteStorage::new("https://example.com/json/", Some("k3y".to_string()))?;

        let url = storage.document_url("/contacts/johndoe.json")?;

        assert_eq!(
            url.as_str(),
            "https://example.com/json/contacts/johndoe.json?apiKey=k3y"
        );
        Ok(())
    }

    #[test]
    fn document_url_keeps_reserved_characters_inside_the_name() -> Result<(), AppError> {
        let storage = RemoteStorage::new("https://example.com/json", Some("k3y".to_string()))?;

        let url = storage.document_url("contacts/x?apiKey=evil")?;
        assert_eq!(
            url.as_str(),
            "https://example.com/json/contacts/x%3FapiKey=evil?apiKey=k3y"
        );

        let url = storage.document_url("contacts/a#b")?;
        assert_eq!(url.as_str(), "https://example.com/json/contacts/a%23b?apiKey=k3y");
        Ok(())
    }

    #[test]
    fn document_url_rejects_dot_segments() -> Result<(), AppError> {
        let storage = RemoteStorage::new("https://example.com/json/", None)?;

        for location in ["../admin/users", "contacts/../../x", "contacts/./a.json", "a//b", ""] {
            assert!(
                matches!(storage.document_url(location), Err(AppError::Validation(_))),
                "{location} should be rejected"
            );
        }
        Ok(())
    }

    #[test]
    fn fragment_like_locations_address_distinct_documents() -> Result<(), AppError> {
        let first = mock("PUT", "/hash-names/a%23b").with_status(201).expect(1).create();
        let second = mock("PUT", "/hash-names/a%23c").with_status(201).expect(1).create();
        let truncated = mock("PUT", "/hash-names/a").with_status(201).expect(0).create();

        let storage = RemoteStorage::new(&server_url(), None)?;
        storage.create("hash-names/a#b", record(json!({"name": "B"})))?;
        storage.create("hash-names/a#c", record(json!({"name": "C"})))?;

        first.assert();
        second.assert();
        truncated.assert();
        Ok(())
    }

    #[test]
    fn parent_segments_never_leave_the_base_path() -> Result<(), AppError> {
        let outside = mock("DELETE", "/admin/users").with_status(204).expect(0).create();

        let storage = RemoteStorage::new(&format!("{}/json", server_url()), None)?;

        assert!(matches!(
            storage.delete("../admin/users"),
            Err(AppError::Validation(_))
        ));
        outside.assert();
        Ok(())
    }

    #[test]
    fn create_sends_conditional_put() -> Result<(), AppError> {
        let m = mock("PUT", "/create-ok/a.json")
            .match_header("if-none-match", "*")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"name": "Alice", "phone": "555"})))
            .with_status(201)
            .create();

        let storage = RemoteStorage::new(&server_url(), None)?;
        storage.create("create-ok/a.json", record(json!({"name": "Alice", "phone": "555"})))?;

        m.assert();
        Ok(())
    }

    #[test]
    fn create_maps_precondition_failure_to_already_exists() -> Result<(), AppError> {
        let _m = mock("PUT", "/create-taken/a.json").with_status(412).create();

        let storage = RemoteStorage::new(&server_url(), None)?;
        let res = storage.create("create-taken/a.json", Record::new());

        assert!(matches!(res, Err(AppError::AlreadyExists(_))));
        Ok(())
    }

    #[test]
    fn read_fetches_document() -> Result<(), AppError> {
        let _m = mock("GET", "/read-ok/a.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"Lauren","phone":"09159652486","email":"","address":""}"#)
            .create();

        let storage = RemoteStorage::new(&server_url(), None)?;
        let stored = storage.read("read-ok/a.json")?;

        assert_eq!(stored.get("name"), Some(&json!("Lauren")));
        assert_eq!(stored.len(), 4);
        Ok(())
    }

    #[test]
    fn update_replaces_existing_document() -> Result<(), AppError> {
        let m = mock("PUT", "/update-ok/a.json")
            .match_header("if-match", "*")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"name": "Bob", "phone": "556"})))
            .with_status(200)
            .create();

        let storage = RemoteStorage::new(&server_url(), None)?;
        storage.update("update-ok/a.json", record(json!({"name": "Bob", "phone": "556"})))?;

        m.assert();
        Ok(())
    }

    #[test]
    fn delete_removes_existing_document() -> Result<(), AppError> {
        let m = mock("DELETE", "/delete-ok/a.json").with_status(204).create();

        let storage = RemoteStorage::new(&server_url(), None)?;
        storage.delete("delete-ok/a.json")?;

        m.assert();
        Ok(())
    }

    #[test]
    fn missing_document_is_not_found() -> Result<(), AppError> {
        let _get = mock("GET", "/missing/a.json").with_status(404).create();
        let _put = mock("PUT", "/missing/a.json")
            .match_header("if-match", "*")
            .with_status(412)
            .create();
        let _delete = mock("DELETE", "/missing/a.json").with_status(404).create();

        let storage = RemoteStorage::new(&server_url(), None)?;

        assert!(matches!(storage.read("missing/a.json"), Err(AppError::NotFound(_))));
        assert!(matches!(
            storage.update("missing/a.json", Record::new()),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(storage.delete("missing/a.json"), Err(AppError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn server_errors_are_transient_failures() -> Result<(), AppError> {
        let _m = mock("DELETE", "/flaky/a.json").with_status(503).create();

        let storage = RemoteStorage::new(&server_url(), None)?;
        let err = storage.delete("flaky/a.json").err();

        assert!(matches!(err, Some(AppError::FailedRequest(_))));
        assert!(err.is_some_and(|e| e.is_transient()));
        Ok(())
    }

    #[test]
    fn non_object_body_is_corrupt() -> Result<(), AppError> {
        let _m = mock("GET", "/corrupt/a.json")
            .with_status(200)
            .with_body("\"just a string\"")
            .create();

        let storage = RemoteStorage::new(&server_url(), None)?;

        assert!(matches!(
            storage.read("corrupt/a.json"),
            Err(AppError::CorruptRecord(_))
        ));
        Ok(())
    }
}

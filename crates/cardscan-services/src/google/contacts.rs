use anyhow::{Context, Result};
use cardscan_core::{Config, ContactRecord};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AccessToken, GoogleError};

/// Given name used when neither a name nor an email is available.
const PLACEHOLDER_NAME: &str = "New Contact";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    pub given_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub formatted_type: String,
    pub formatted_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDefined {
    pub key: String,
    pub value: String,
}

/// People API `Person` body for `people:createContact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonResource {
    pub names: Vec<PersonName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<ValueEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<ValueEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<Organization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<PostalAddress>,
    #[serde(default)]
    pub user_defined: Vec<UserDefined>,
}

/// Map a contact record onto a People API person.
pub fn build_person(record: &ContactRecord) -> PersonResource {
    let given_name = if !record.name.is_empty() {
        record.name.clone()
    } else {
        record
            .email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .unwrap_or(PLACEHOLDER_NAME)
            .to_string()
    };

    let value_of = |value: &str| {
        if value.is_empty() {
            Vec::new()
        } else {
            vec![ValueEntry {
                value: value.to_string(),
            }]
        }
    };

    let organizations = if record.company.is_empty() {
        Vec::new()
    } else {
        vec![Organization {
            name: record.company.clone(),
            title: record.designation.clone(),
        }]
    };

    let addresses = if record.address.is_empty() {
        Vec::new()
    } else {
        vec![PostalAddress {
            formatted_type: "Work".to_string(),
            formatted_value: record.address.clone(),
        }]
    };

    PersonResource {
        names: vec![PersonName { given_name }],
        email_addresses: value_of(&record.email),
        phone_numbers: value_of(&record.phone),
        organizations,
        addresses,
        user_defined: vec![UserDefined {
            key: "Website".to_string(),
            value: record.website.clone(),
        }],
    }
}

/// People API client
#[derive(Debug, Clone)]
pub struct GoogleContactsClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GoogleContactsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Google People API")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.google_people_api_url(),
            Duration::from_secs(config.google_timeout_secs()),
        )
    }

    /// Create one contact. Single attempt, no retry.
    pub async fn create_contact(
        &self,
        token: &AccessToken,
        record: &ContactRecord,
    ) -> Result<(), GoogleError> {
        let person = build_person(record);

        let response = self
            .http_client
            .post(format!("{}/people:createContact", self.base_url))
            .bearer_auth(&token.access_token)
            .json(&person)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GoogleError::Status { status, body });
        }

        Ok(())
    }

    /// Create every contact in order, returning `(synced, failed)`.
    ///
    /// A failed contact is logged and counted; it never stops the rest.
    pub async fn sync_contacts(
        &self,
        token: &AccessToken,
        records: &[ContactRecord],
    ) -> (usize, usize) {
        let mut synced = 0;
        let mut failed = 0;

        for (index, record) in records.iter().enumerate() {
            match self.create_contact(token, record).await {
                Ok(()) => synced += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(error = %e, contact = index + 1, "Failed to create Google contact");
                }
            }
        }

        tracing::info!(synced, failed, "Google contacts sync finished");
        (synced, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn token() -> AccessToken {
        serde_json::from_str(r#"{"access_token": "ya29.token"}"#).unwrap()
    }

    fn full_record() -> ContactRecord {
        ContactRecord {
            name: "Jane Doe".to_string(),
            designation: "CTO".to_string(),
            company: "ACME".to_string(),
            phone: "+1 555 0100".to_string(),
            email: "jane@acme.example".to_string(),
            address: "1 Main St".to_string(),
            website: "acme.example".to_string(),
            raw_text: "Jane Doe CTO ACME".to_string(),
        }
    }

    #[test]
    fn test_build_person_full_record() {
        let value = serde_json::to_value(build_person(&full_record())).unwrap();
        assert_eq!(
            value,
            json!({
                "names": [{"givenName": "Jane Doe"}],
                "emailAddresses": [{"value": "jane@acme.example"}],
                "phoneNumbers": [{"value": "+1 555 0100"}],
                "organizations": [{"name": "ACME", "title": "CTO"}],
                "addresses": [{"formattedType": "Work", "formattedValue": "1 Main St"}],
                "userDefined": [{"key": "Website", "value": "acme.example"}]
            })
        );
    }

    #[test]
    fn test_given_name_falls_back_to_email_local_part() {
        let record = ContactRecord {
            email: "sales@acme.example".to_string(),
            ..ContactRecord::default()
        };
        assert_eq!(build_person(&record).names[0].given_name, "sales");
    }

    #[test]
    fn test_given_name_placeholder_and_omitted_sections() {
        let person = build_person(&ContactRecord::fallback("unreadable"));
        assert_eq!(person.names[0].given_name, "New Contact");

        let value = serde_json::to_value(&person).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("emailAddresses"));
        assert!(!object.contains_key("phoneNumbers"));
        assert!(!object.contains_key("organizations"));
        assert!(!object.contains_key("addresses"));
        assert_eq!(value["userDefined"], json!([{"key": "Website", "value": ""}]));
    }

    #[tokio::test]
    async fn test_create_contact_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/people:createContact")
            .match_header("authorization", "Bearer ya29.token")
            .match_body(Matcher::PartialJson(json!({
                "names": [{"givenName": "Jane Doe"}]
            })))
            .with_status(200)
            .with_body(r#"{"resourceName": "people/c1"}"#)
            .create_async()
            .await;

        let client = GoogleContactsClient::new(server.url(), Duration::from_secs(5)).unwrap();
        client.create_contact(&token(), &full_record()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sync_counts_failures_without_aborting() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/people:createContact")
            .match_body(Matcher::PartialJson(json!({"names": [{"givenName": "Broken"}]})))
            .with_status(400)
            .with_body("invalid person")
            .create_async()
            .await;
        let ok = server
            .mock("POST", "/people:createContact")
            .match_body(Matcher::PartialJson(json!({"names": [{"givenName": "Jane Doe"}]})))
            .with_status(200)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;

        let broken = ContactRecord {
            name: "Broken".to_string(),
            ..ContactRecord::default()
        };
        let client =
            GoogleContactsClient::new(format!("{}/", server.url()), Duration::from_secs(5)).unwrap();
        let (synced, failed) = client
            .sync_contacts(&token(), &[full_record(), broken, full_record()])
            .await;

        assert_eq!((synced, failed), (2, 1));
        ok.assert_async().await;
    }
}

use crate::error::{EventError, ProcessError};
use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use serde_json::json;

/// Bucket and key of one notification record, the key still form-encoded
/// as S3 delivers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    /// The object key with '+' and %XX escapes decoded.
    pub fn decoded_key(&self) -> Result<String, ProcessError> {
        urlencoding::decode(&self.key.replace('+', " "))
            .map(|decoded| decoded.into_owned())
            .map_err(|source| ProcessError::InvalidKey {
                key: self.key.clone(),
                source,
            })
    }
}

/// Yields the object each record of `event` points at, in order.
pub fn object_refs(event: &S3Event) -> impl Iterator<Item = Result<ObjectRef, EventError>> + '_ {
    event
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| object_ref(index, record))
}

fn object_ref(index: usize, record: &S3EventRecord) -> Result<ObjectRef, EventError> {
    let s3_target = &record.s3;
    let bucket = s3_target
        .bucket
        .name
        .clone()
        .ok_or(EventError::MissingBucket { index })?;
    let key = s3_target
        .object
        .key
        .clone()
        .ok_or(EventError::MissingKey { index })?;

    Ok(ObjectRef { bucket, key })
}

/// Builds an `ObjectCreated:Put` notification with one record per
/// `(bucket, key)` pair, shaped like the events S3 delivers.
pub fn notification(objects: &[(&str, &str)]) -> Result<S3Event, serde_json::Error> {
    let records = objects
        .iter()
        .map(|(bucket, key)| {
            json!({
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventTime": "1970-01-01T00:00:00.000Z",
                "eventName": "ObjectCreated:Put",
                "userIdentity": { "principalId": "EXAMPLE" },
                "requestParameters": { "sourceIPAddress": "127.0.0.1" },
                "responseElements": {
                    "x-amz-request-id": "EXAMPLE123456789",
                    "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome/mnopqrstuvwxyzABCDEFGH"
                },
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "resize-on-upload",
                    "bucket": {
                        "name": bucket,
                        "ownerIdentity": { "principalId": "EXAMPLE" },
                        "arn": format!("arn:aws:s3:::{bucket}")
                    },
                    "object": {
                        "key": key,
                        "size": 1024,
                        "eTag": "0123456789abcdef0123456789abcdef",
                        "sequencer": "0A1B2C3D4E5F678901"
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    serde_json::from_value(json!({ "Records": records }))
}

#[cfg(test)]
mod tests {
    use super::{notification, object_refs, ObjectRef};
    use crate::error::{EventError, ProcessError};

    #[test]
    fn yields_records_in_order() {
        let event = notification(&[("bucket_name", "object_key"), ("raw", "a/b/photo.JPG")]).unwrap();

        let refs = object_refs(&event).collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(
            refs,
            vec![
                ObjectRef {
                    bucket: "bucket_name".to_string(),
                    key: "object_key".to_string()
                },
                ObjectRef {
                    bucket: "raw".to_string(),
                    key: "a/b/photo.JPG".to_string()
                },
            ]
        );
    }

    #[test]
    fn decodes_keys() {
        let event = notification(&[("raw", "holiday+photos/beach%281%29.png")]).unwrap();

        let object = object_refs(&event).next().unwrap().unwrap();

        assert_eq!(object.key, "holiday+photos/beach%281%29.png");
        assert_eq!(object.decoded_key().unwrap(), "holiday photos/beach(1).png");
    }

    #[test]
    fn empty_event_has_no_records() {
        let event = notification(&[]).unwrap();

        assert_eq!(object_refs(&event).count(), 0);
    }

    #[test]
    fn missing_fields_fail_loudly() {
        let mut event = notification(&[("raw", "one.png"), ("raw", "two.png")]).unwrap();
        event.records[1].s3.object.key = None;

        let refs = object_refs(&event).collect::<Vec<_>>();

        assert!(refs[0].is_ok());
        assert!(matches!(refs[1], Err(EventError::MissingKey { index: 1 })));

        event.records[0].s3.bucket.name = None;
        let first = object_refs(&event).next().unwrap();
        assert!(matches!(first, Err(EventError::MissingBucket { index: 0 })));
    }

    #[test]
    fn invalid_escape_fails_only_its_key() {
        let event = notification(&[("raw", "bad%FFkey"), ("raw", "good.png")]).unwrap();

        let refs = object_refs(&event).collect::<Result<Vec<_>, _>>().unwrap();

        assert!(matches!(
            refs[0].decoded_key(),
            Err(ProcessError::InvalidKey { ref key, .. }) if key == "bad%FFkey"
        ));
        assert_eq!(refs[1].decoded_key().unwrap(), "good.png");
    }

    #[test]
    fn parses_minimal_payload() {
        let event: Result<aws_lambda_events::event::s3::S3Event, _> =
            serde_json::from_str(r#"{"Records": []}"#);

        assert!(event.is_ok());
    }
}

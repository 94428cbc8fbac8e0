use std::collections::BTreeMap;

use {
    async_trait::async_trait,
    serde_json::Value,
    tracing::{debug, info},
};

use {
    beacon_history::{ChannelSnapshot, Field, FieldValue, HistoryStore},
    beacon_search::{Kind, Step, find_by_key, path_query},
};

use crate::{
    error::{Error, Result},
    id::IdKind,
    page,
};

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// Resolve one identifier to its channel's current state.
///
/// Implementations fetch and parse whatever they need *before* touching the
/// store, then commit exactly one upsert. `Ok(None)` means the identifier
/// does not exist upstream.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(
        &self,
        store: &HistoryStore,
        kind: IdKind,
        id: &str,
    ) -> Result<Option<ChannelSnapshot>>;
}

/// Driver for channels hosted on the video platform's public pages.
pub struct YoutubeResolver {
    client: reqwest::Client,
    base_url: String,
}

impl YoutubeResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for YoutubeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl Resolve for YoutubeResolver {
    async fn resolve(
        &self,
        store: &HistoryStore,
        kind: IdKind,
        id: &str,
    ) -> Result<Option<ChannelSnapshot>> {
        info!(kind = %kind, id, "resolving");
        match kind {
            IdKind::VideoId => self.resolve_video(store, id).await,
            IdKind::YtId => {
                self.resolve_channel(store, kind, &format!("/channel/{id}/streams"), id)
                    .await
            },
            IdKind::YtHandle => {
                self.resolve_channel(store, kind, &format!("/@{id}/streams"), id)
                    .await
            },
            IdKind::YtOldHandle => {
                self.resolve_channel(store, kind, &format!("/c/{id}/streams"), id)
                    .await
            },
        }
    }
}

impl YoutubeResolver {
    /// Resolve from the channel's streams page.
    ///
    /// The page lists upcoming streams and recent videos together. An
    /// upcoming stream is recorded but the scan keeps going in case a live
    /// one follows; a "watching" view count means live and ends the scan;
    /// a scan that found neither clears the video snapshot.
    async fn resolve_channel(
        &self,
        store: &HistoryStore,
        kind: IdKind,
        path: &str,
        id: &str,
    ) -> Result<Option<ChannelSnapshot>> {
        let Some(doc) = page::fetch_initial_data(&self.client, &self.base_url, path).await? else {
            return Ok(None);
        };

        let metadata = path_query(&doc, Kind::Map, &[
            Step::Key("metadata"),
            Step::Key("channelMetadataRenderer"),
        ]);
        let external_id = path_query(&metadata, Kind::Str, &[Step::Key("externalId")]);
        let Some(external_id) = external_id.as_str().filter(|s| !s.is_empty()) else {
            return Err(Error::UnexpectedDocument {
                missing: "channel metadata",
            });
        };

        let predicate = [(Field::YtId, FieldValue::from(external_id))];

        // Identity and display fields are only preserved, never overwritten:
        // a channel rename upstream must not clobber a curated name.
        let mut preserve: BTreeMap<Field, FieldValue> = BTreeMap::new();
        if let Some(title) = path_query(&metadata, Kind::Str, &[Step::Key("title")])
            .as_str()
            .filter(|s| !s.is_empty())
        {
            preserve.insert(Field::Name, title.into());
        }
        preserve.insert(kind.field(), id.into());
        if let Some(handle) = path_query(&metadata, Kind::Str, &[Step::Key("vanityChannelUrl")])
            .as_str()
            .and_then(vanity_handle)
        {
            preserve.insert(Field::YtHandle, handle.into());
        }
        let preserve: Vec<(Field, FieldValue)> = preserve.into_iter().collect();

        let mut recorded_upcoming = false;
        for vdata in find_by_key(&doc, "videoRenderer") {
            if let Some(event) = find_by_key(vdata, "upcomingEventData").first() {
                debug!(id, "recorded upcoming stream");
                store.upsert(&predicate, &preserve, &[
                    (Field::Live, Some(false.into())),
                    (Field::VideoId, video_id(vdata)),
                    (Field::VideoName, video_title(vdata)),
                    (Field::StartTime, start_time(event)),
                ])?;
                recorded_upcoming = true;
                continue;
            }

            let texts = vdata
                .get("viewCountText")
                .map(|node| find_by_key(node, "text"))
                .unwrap_or_default();
            let joined = texts
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if joined.contains("watching") {
                let snap = store.upsert(&predicate, &preserve, &[
                    (Field::Live, Some(true.into())),
                    (Field::VideoId, video_id(vdata)),
                    (Field::VideoName, video_title(vdata)),
                    (Field::StartTime, None),
                ])?;
                return Ok(Some(snap));
            }
        }

        if recorded_upcoming {
            return Ok(store.find_one(&predicate));
        }

        let snap = store.upsert(&predicate, &preserve, &[
            (Field::Live, Some(false.into())),
            (Field::VideoId, None),
            (Field::VideoName, None),
            (Field::StartTime, None),
        ])?;
        Ok(Some(snap))
    }

    /// Resolve from a single video's watch page.
    async fn resolve_video(
        &self,
        store: &HistoryStore,
        id: &str,
    ) -> Result<Option<ChannelSnapshot>> {
        let path = format!("/watch?v={id}");
        let Some(doc) = page::fetch_initial_data(&self.client, &self.base_url, &path).await? else {
            return Ok(None);
        };

        let primary = find_by_key(&doc, "videoPrimaryInfoRenderer");
        let Some(vdata) = primary.first() else {
            return Err(Error::UnexpectedDocument {
                missing: "video info",
            });
        };
        let owner = find_by_key(&doc, "videoOwnerRenderer");
        let Some(cdata) = owner.first() else {
            return Err(Error::UnexpectedDocument {
                missing: "video owner",
            });
        };
        let Some(browse_id) = find_by_key(cdata, "browseId")
            .first()
            .and_then(|v| v.as_str())
        else {
            return Err(Error::UnexpectedDocument {
                missing: "channel id",
            });
        };

        let live = find_by_key(vdata, "isLive")
            .first()
            .map(|v| v.as_bool().unwrap_or(true))
            .unwrap_or(false);

        let mut preserve: Vec<(Field, FieldValue)> = Vec::new();
        if let Some(name) = video_title(cdata) {
            preserve.push((Field::Name, name));
        }
        if let Some(handle) = find_by_key(cdata, "canonicalBaseUrl")
            .first()
            .and_then(|v| v.as_str())
            .and_then(|url| url.strip_prefix("/@"))
        {
            preserve.push((Field::YtHandle, handle.into()));
        }

        let predicate = [(Field::YtId, FieldValue::from(browse_id))];
        let snap = store.upsert(&predicate, &preserve, &[
            (Field::Live, Some(live.into())),
            (
                Field::VideoId,
                live.then(|| FieldValue::from(id)),
            ),
            (Field::VideoName, None),
            (Field::StartTime, None),
        ])?;
        Ok(Some(snap))
    }
}

fn video_id(vdata: &Value) -> Option<FieldValue> {
    vdata
        .get("videoId")
        .and_then(Value::as_str)
        .map(FieldValue::from)
}

/// First text run of a renderer's title.
fn video_title(node: &Value) -> Option<FieldValue> {
    let title = node.get("title")?;
    find_by_key(title, "text")
        .first()
        .and_then(|v| v.as_str())
        .map(FieldValue::from)
}

/// The page serializes the scheduled epoch as a decimal string; tolerate a
/// bare number too.
fn start_time(event: &Value) -> Option<FieldValue> {
    let raw = event.get("startTime")?;
    raw.as_i64()
        .or_else(|| raw.as_str().and_then(|s| s.parse().ok()))
        .map(FieldValue::from)
}

/// Channel handle out of a vanity URL like `http://www.youtube.com/@Handle`.
fn vanity_handle(url: &str) -> Option<String> {
    url.rsplit_once("/@").map(|(_, handle)| handle.to_string())
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn page_body(doc: &Value) -> String {
        format!("<html><script>var ytInitialData = {doc};</script></html>")
    }

    fn channel_doc(videos: Value) -> Value {
        json!({
            "metadata": {
                "channelMetadataRenderer": {
                    "externalId": "UC1",
                    "title": "Acme",
                    "vanityChannelUrl": "http://www.youtube.com/@acme",
                },
            },
            "contents": videos,
        })
    }

    fn temp_store() -> (HistoryStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn live_stream_is_committed_with_a_live_snapshot() {
        let doc = channel_doc(json!([{
            "videoRenderer": {
                "videoId": "v1",
                "title": {"runs": [{"text": "Launch Day"}]},
                "viewCountText": {"runs": [{"text": "1,234"}, {"text": " watching"}]},
            },
        }]));
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/channel/UC1/streams")
            .with_body(page_body(&doc))
            .create_async()
            .await;

        let (store, _dir) = temp_store();
        let resolver = YoutubeResolver::new(server.url());
        let snap = resolver
            .resolve(&store, IdKind::YtId, "UC1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snap.get(Field::Live), Some(&true.into()));
        assert_eq!(snap.get(Field::VideoId), Some(&"v1".into()));
        assert_eq!(snap.get(Field::VideoName), Some(&"Launch Day".into()));
        assert_eq!(snap.get(Field::StartTime), None);
        assert_eq!(snap.get(Field::Name), Some(&"Acme".into()));
        assert_eq!(snap.get(Field::YtHandle), Some(&"acme".into()));
    }

    #[tokio::test]
    async fn upcoming_stream_is_kept_when_nothing_is_live() {
        let doc = channel_doc(json!([{
            "videoRenderer": {
                "videoId": "v2",
                "title": {"runs": [{"text": "Premiere"}]},
                "upcomingEventData": {"startTime": "1700000000"},
                "viewCountText": {"runs": [{"text": "12 waiting"}]},
            },
        }]));
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/channel/UC1/streams")
            .with_body(page_body(&doc))
            .create_async()
            .await;

        let (store, _dir) = temp_store();
        let resolver = YoutubeResolver::new(server.url());
        let snap = resolver
            .resolve(&store, IdKind::YtId, "UC1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snap.get(Field::Live), Some(&false.into()));
        assert_eq!(snap.get(Field::VideoId), Some(&"v2".into()));
        assert_eq!(snap.get(Field::StartTime), Some(&1_700_000_000_i64.into()));
    }

    #[tokio::test]
    async fn quiet_channel_gets_its_snapshot_cleared() {
        let doc = channel_doc(json!([{
            "videoRenderer": {
                "videoId": "v3",
                "title": {"runs": [{"text": "Old Video"}]},
                "viewCountText": {"runs": [{"text": "10,000 views"}]},
            },
        }]));
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/@acme/streams")
            .with_body(page_body(&doc))
            .create_async()
            .await;

        let (store, _dir) = temp_store();
        // Seed live state from an earlier observation.
        store
            .upsert(&[(Field::YtId, "UC1".into())], &[], &[
                (Field::Live, Some(true.into())),
                (Field::VideoId, Some("v0".into())),
            ])
            .unwrap();

        let resolver = YoutubeResolver::new(server.url());
        let snap = resolver
            .resolve(&store, IdKind::YtHandle, "acme")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snap.get(Field::Live), Some(&false.into()));
        assert_eq!(snap.get(Field::VideoId), None);
        assert_eq!(snap.get(Field::VideoName), None);
        // The queried handle is preserved onto the record.
        assert_eq!(snap.get(Field::YtHandle), Some(&"acme".into()));
    }

    #[tokio::test]
    async fn watch_page_resolves_the_owning_channel() {
        let doc = json!({
            "contents": {
                "videoPrimaryInfoRenderer": {
                    "title": {"runs": [{"text": "Launch Day"}]},
                    "viewCount": {"isLive": true},
                },
                "secondaryInfo": {
                    "videoOwnerRenderer": {
                        "title": {"runs": [{"text": "Acme"}]},
                        "navigationEndpoint": {
                            "browseEndpoint": {
                                "browseId": "UC1",
                                "canonicalBaseUrl": "/@acme",
                            },
                        },
                    },
                },
            },
        });
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/watch")
            .match_query(mockito::Matcher::UrlEncoded("v".into(), "v1".into()))
            .with_body(page_body(&doc))
            .create_async()
            .await;

        let (store, _dir) = temp_store();
        let resolver = YoutubeResolver::new(server.url());
        let snap = resolver
            .resolve(&store, IdKind::VideoId, "v1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snap.get(Field::YtId), Some(&"UC1".into()));
        assert_eq!(snap.get(Field::Live), Some(&true.into()));
        assert_eq!(snap.get(Field::VideoId), Some(&"v1".into()));
        assert_eq!(snap.get(Field::Name), Some(&"Acme".into()));
        assert_eq!(snap.get(Field::YtHandle), Some(&"acme".into()));
    }

    #[tokio::test]
    async fn missing_page_resolves_to_none_and_leaves_the_store_alone() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/channel/UCgone/streams")
            .with_status(404)
            .create_async()
            .await;

        let (store, _dir) = temp_store();
        let resolver = YoutubeResolver::new(server.url());
        let resolved = resolver
            .resolve(&store, IdKind::YtId, "UCgone")
            .await
            .unwrap();

        assert!(resolved.is_none());
        assert_eq!(store.channel_count(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_an_error_and_leaves_the_store_alone() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/channel/UC1/streams")
            .with_status(503)
            .create_async()
            .await;

        let (store, _dir) = temp_store();
        let resolver = YoutubeResolver::new(server.url());
        let err = resolver
            .resolve(&store, IdKind::YtId, "UC1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status { status: 503, .. }));
        assert_eq!(store.channel_count(), 0);
    }

    #[tokio::test]
    async fn reshaped_document_is_an_error_and_leaves_the_store_alone() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/channel/UC1/streams")
            .with_body(page_body(&json!({"metadata": {}})))
            .create_async()
            .await;

        let (store, _dir) = temp_store();
        let resolver = YoutubeResolver::new(server.url());
        let err = resolver
            .resolve(&store, IdKind::YtId, "UC1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnexpectedDocument { .. }));
        assert_eq!(store.channel_count(), 0);
    }
}

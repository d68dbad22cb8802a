use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use super::client::decode_envelope;
use super::*;
use crate::config::{ApiSettings, Settings};
use crate::library::Track;

/// What the stub server saw for one request.
#[derive(Debug)]
struct Seen {
    request_line: String,
    authorization: Option<String>,
    body: String,
}

/// Serve `responses` in order, one connection each, on a local port.
fn stub_server(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let (stream, _) = match listener.accept() {
                Ok(s) => s,
                Err(_) => return,
            };
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut authorization = None;
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    let value = value.trim().to_string();
                    match name.to_ascii_lowercase().as_str() {
                        "authorization" => authorization = Some(value),
                        "content-length" => content_length = value.parse().unwrap_or(0),
                        _ => {}
                    }
                }
            }
            let mut req_body = vec![0u8; content_length];
            reader.read_exact(&mut req_body).unwrap();

            let _ = tx.send(Seen {
                request_line: request_line.trim_end().to_string(),
                authorization,
                body: String::from_utf8_lossy(&req_body).into_owned(),
            });

            let mut stream = stream;
            let reply = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });

    (format!("http://{addr}"), rx)
}

fn api_settings(token: Option<&str>) -> ApiSettings {
    ApiSettings {
        token: token.map(str::to_string),
        timeout_secs: 5,
        ..ApiSettings::default()
    }
}

const SONGS: &str = r#"{
    "success": true,
    "message": "ok",
    "timestamp": "2024-01-01T00:00:00Z",
    "data": [
        {"_id": "s1", "name": "Intro", "artist": ["Ana"], "imageURL": "https://img/1.jpg",
         "songURL": "https://cdn/1.mp3", "language": "en", "category": ["pop"],
         "isPublic": true, "playCount": 3, "duration": 61.5},
        {"id": "s2", "name": "Outro", "artist": ["Ana", "Bo"], "songURL": "https://cdn/2.mp3"}
    ]
}"#;

#[test]
fn decode_unwraps_successful_envelope() {
    let data: Option<Vec<SongRecord>> = decode_envelope(200, SONGS).unwrap();
    let songs = data.unwrap();
    assert_eq!(songs.len(), 2);
    assert_eq!(songs[0].id, "s1");
    assert_eq!(songs[0].play_count, 3);
    assert_eq!(songs[1].id, "s2");
    assert!(songs[1].is_public);
    assert_eq!(songs[1].duration, None);
}

#[test]
fn decode_maps_auth_statuses() {
    let body = r#"{"success": false, "message": "jwt expired", "data": null}"#;
    let err = decode_envelope::<()>(401, body).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { ref message } if message == "jwt expired"));
    assert_eq!(err.status(), Some(401));
    assert!(err.notice().contains("sign in again"));

    let err = decode_envelope::<()>(403, body).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }));
    assert!(err.notice().contains("admin"));
}

#[test]
fn decode_treats_unsuccessful_envelope_as_status_error() {
    let body = r#"{"success": false, "message": "Song not found"}"#;
    let err = decode_envelope::<SongRecord>(200, body).unwrap_err();
    assert!(matches!(
        err,
        ApiError::Status { status: 200, ref message } if message == "Song not found"
    ));

    let err = decode_envelope::<SongRecord>(404, body).unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(!err.is_auth());
}

#[test]
fn decode_handles_bodies_without_envelope() {
    let err = decode_envelope::<()>(502, "Bad Gateway").unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 502, ref message } if message == "Bad Gateway"));

    let err = decode_envelope::<()>(200, "<html>").unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn song_record_becomes_track() {
    let data: Option<Vec<SongRecord>> = decode_envelope(200, SONGS).unwrap();
    let fields = [crate::config::TrackDisplayField::Display];
    let tracks: Vec<Track> = data
        .unwrap()
        .into_iter()
        .map(|r| r.into_track(&fields, " - "))
        .collect();

    assert_eq!(tracks[0].media_url, "https://cdn/1.mp3");
    assert_eq!(tracks[0].artwork_url, "https://img/1.jpg");
    assert_eq!(tracks[0].duration, Some(std::time::Duration::from_millis(61_500)));
    assert_eq!(tracks[1].display, "Ana, Bo - Outro");
}

#[test]
fn playlist_record_keeps_song_order() {
    let body = r#"{"success": true, "message": "", "data": {
        "_id": "p1", "name": "Mix",
        "songs": [
            {"song": {"_id": "b", "name": "B", "songURL": "u/b"}, "addedAt": "2024-02-01"},
            {"song": {"_id": "a", "name": "A", "songURL": "u/a"}}
        ]}}"#;
    let record: PlaylistRecord = decode_envelope(200, body).unwrap().unwrap();
    assert_eq!(record.summary().song_count, 2);

    let playlist = record.into_playlist(&[crate::config::TrackDisplayField::Title], " - ");
    let ids: Vec<_> = playlist.tracks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(playlist.items[0].added_at.as_deref(), Some("2024-02-01"));
}

#[test]
fn user_record_reads_role_and_favourites() {
    let body = r#"{"success": true, "message": "", "data":
        {"_id": "u1", "name": "Kim", "role": "admin", "favourites": ["s1", "s9"]}}"#;
    let user: UserRecord = decode_envelope(200, body).unwrap().unwrap();
    assert!(user.is_admin());
    assert_eq!(user.favourites, vec!["s1", "s9"]);

    let member: UserRecord =
        decode_envelope(200, r#"{"success": true, "data": {"id": "u2", "name": "Lee"}}"#)
            .unwrap()
            .unwrap();
    assert_eq!(member.role, Role::Member);
}

#[test]
fn client_sends_bearer_token_and_lists_songs() {
    let (base, seen) = stub_server(vec![(200, SONGS.to_string())]);
    let client = ApiClient::new(&base, &api_settings(Some("tok-123")));

    let songs: Vec<SongRecord> = client.list(Resource::Songs).unwrap();
    assert_eq!(songs.len(), 2);

    let req = seen.recv().unwrap();
    assert_eq!(req.request_line, "GET /songs HTTP/1.1");
    assert_eq!(req.authorization.as_deref(), Some("Bearer tok-123"));
}

#[test]
fn client_omits_authorization_without_token() {
    let (base, seen) = stub_server(vec![(200, r#"{"success": true, "data": []}"#.to_string())]);
    let client = ApiClient::new(&format!("{base}/"), &api_settings(None));

    let artists: Vec<ArtistRecord> = client.list(Resource::Artists).unwrap();
    assert!(artists.is_empty());

    let req = seen.recv().unwrap();
    assert_eq!(req.request_line, "GET /artists HTTP/1.1");
    assert_eq!(req.authorization, None);
}

#[test]
fn client_surfaces_401_and_403() {
    let (base, _seen) = stub_server(vec![
        (401, r#"{"success": false, "message": "token expired"}"#.to_string()),
        (403, r#"{"success": false, "message": "admin only"}"#.to_string()),
    ]);
    let client = ApiClient::new(&base, &api_settings(Some("t")));

    let err = client.list::<SongRecord>(Resource::Songs).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));

    let err = client.delete(Resource::Songs, "s1").unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }));
}

#[test]
fn toggle_favourite_puts_song_id() {
    let reply = r#"{"success": true, "data": {"_id": "u1", "name": "Kim", "favourites": ["s2"]}}"#;
    let (base, seen) = stub_server(vec![(200, reply.to_string())]);
    let client = ApiClient::new(&base, &api_settings(Some("t")));

    let user = client.toggle_favourite("u1", "s2").unwrap();
    assert_eq!(user.favourites, vec!["s2"]);

    let req = seen.recv().unwrap();
    assert_eq!(req.request_line, "PUT /users/u1/favourites HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body["songId"], "s2");
}

#[test]
fn remove_playlist_song_hits_nested_route() {
    let (base, seen) = stub_server(vec![(200, r#"{"success": true, "data": null}"#.to_string())]);
    let client = ApiClient::new(&base, &api_settings(Some("t")));

    client.remove_playlist_song("p1", "s3").unwrap();
    let req = seen.recv().unwrap();
    assert_eq!(req.request_line, "DELETE /playlists/p1/songs/s3 HTTP/1.1");
}

#[test]
fn add_playlist_song_posts_the_song_id() {
    let body = r#"{"success": true, "data": {"_id": "p1", "name": "Mix", "songs": []}}"#;
    let (base, seen) = stub_server(vec![(201, body.to_string())]);
    let client = ApiClient::new(&base, &api_settings(Some("t")));

    let record = client.add_playlist_song("p1", "s3").unwrap();
    assert_eq!(record.summary().id, "p1");
    let req = seen.recv().unwrap();
    assert_eq!(req.request_line, "POST /playlists/p1/songs HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body["songId"], "s3");
}

#[test]
fn create_posts_the_record_to_the_collection() {
    let reply = r#"{"success": true, "data": {"_id": "ar9", "name": "Nina", "imageURL": "https://img/n.png"}}"#;
    let (base, seen) = stub_server(vec![(201, reply.to_string())]);
    let client = ApiClient::new(&base, &api_settings(Some("t")));

    let created: ArtistRecord = client
        .create(
            Resource::Artists,
            &serde_json::json!({"name": "Nina", "imageURL": "https://img/n.png"}),
        )
        .unwrap();
    assert_eq!(created.id, "ar9");
    assert_eq!(created.image_url, "https://img/n.png");

    let req = seen.recv().unwrap();
    assert_eq!(req.request_line, "POST /artists HTTP/1.1");
    assert_eq!(req.authorization.as_deref(), Some("Bearer t"));
    let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body["name"], "Nina");
}

#[test]
fn update_puts_the_record_at_its_id() {
    let reply = r#"{"success": true, "data": {"_id": "al2", "name": "Renamed", "artist": ["ar9"]}}"#;
    let (base, seen) = stub_server(vec![(200, reply.to_string())]);
    let client = ApiClient::new(&base, &api_settings(Some("t")));

    let updated: AlbumRecord = client
        .update(Resource::Albums, "al2", &serde_json::json!({"name": "Renamed"}))
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.artist, vec!["ar9"]);

    let req = seen.recv().unwrap();
    assert_eq!(req.request_line, "PUT /albums/al2 HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body, serde_json::json!({"name": "Renamed"}));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{addr}"), &api_settings(None));
    let err = client.list::<SongRecord>(Resource::Songs).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[test]
fn blob_store_only_owns_its_prefix() {
    let client = ApiClient::new("http://127.0.0.1:1", &api_settings(None));
    let blobs = BlobStore::new(client, "https://storage.example/bucket/");

    assert!(blobs.owns("https://storage.example/bucket/songs/a.mp3"));
    assert!(!blobs.owns("https://storage.example/bucket"));
    assert!(!blobs.owns("https://storage.example/bucketeer/a.mp3"));
    assert!(!blobs.owns("https://elsewhere/a.mp3"));
    assert!(!blobs.owns(""));
    assert!(!blobs.delete("https://elsewhere/a.mp3"));
}

#[test]
fn delete_song_cleans_up_blobs_after_record() {
    let (base, seen) = stub_server(vec![
        (200, r#"{"success": true, "data": null}"#.to_string()),
        (204, String::new()),
        (500, "boom".to_string()),
    ]);

    let mut settings = Settings::default();
    settings.api.base_url = Some(base.clone());
    settings.api.storage_base_url = Some(format!("{base}/blobs"));
    let source = ApiSource::from_settings(&settings).unwrap();

    let track = Track {
        id: "s1".into(),
        name: "Intro".into(),
        artists: vec![],
        album: None,
        media_url: format!("{base}/blobs/s1.mp3"),
        artwork_url: format!("{base}/blobs/s1.jpg"),
        duration: None,
        display: "Intro".into(),
    };
    // The failed artwork delete is only logged.
    source.delete_song(&track).unwrap();

    let lines: Vec<String> = seen.iter().take(3).map(|s| s.request_line).collect();
    assert_eq!(
        lines,
        vec![
            "DELETE /songs/s1 HTTP/1.1",
            "DELETE /blobs/s1.mp3 HTTP/1.1",
            "DELETE /blobs/s1.jpg HTTP/1.1",
        ]
    );
}

#[test]
fn api_source_requires_base_url() {
    assert!(ApiSource::from_settings(&Settings::default()).is_none());
}

#[test]
fn local_source_reports_unsupported_capabilities() {
    let dir = tempfile::tempdir().unwrap();
    let source = LocalSource::new(dir.path().to_path_buf(), Default::default());
    assert!(source.songs().unwrap().is_empty());
    assert!(source.profile().unwrap().is_none());
    assert!(matches!(
        source.toggle_favourite("x"),
        Err(ApiError::Unsupported(_))
    ));
}

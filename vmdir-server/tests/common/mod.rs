//! Shared server fixtures.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use vmdir_server::{DirectoryServerState, ServerConfig};
use vmdir_types::{ChangeEvent, ChangeKind, SessionId};
use vmdir_watch::{WatchClient, WatchError, WatchResult};

pub const SCHEMA_FILE: &str = "\
# base schema
attributetypes: ( 2.5.4.0 NAME 'objectClass'
  SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 )
attributetypes: ( 2.5.4.41 NAME 'name' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )
attributetypes: ( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )
attributetypes: ( 2.5.4.13 NAME 'description' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )
attributetypes: ( 1.2.840.113556.1.4.221 NAME 'sAMAccountName'
  SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 SINGLE-VALUE )
objectclasses: ( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )
objectclasses: ( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST cn MAY description )
attributeindices: ( NAME 'cn' )
";

pub fn schema_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCHEMA_FILE.as_bytes()).unwrap();
    file
}

pub fn config_with_schema(file: &tempfile::NamedTempFile) -> ServerConfig {
    ServerConfig {
        schema_file: Some(file.path().to_path_buf()),
        invocation_id: Some("local-dc".into()),
        poll_timeout_ms: 20,
        ..Default::default()
    }
}

pub fn state() -> Arc<DirectoryServerState> {
    let file = schema_file();
    Arc::new(DirectoryServerState::new(&config_with_schema(&file)).unwrap())
}

#[derive(Default)]
pub struct RecordingClient {
    pub delivered: Mutex<Vec<(SessionId, ChangeEvent)>>,
    pub fail: bool,
}

impl RecordingClient {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn revisions(&self) -> Vec<u64> {
        self.delivered.lock().iter().map(|(_, e)| e.revision).collect()
    }
}

impl WatchClient for RecordingClient {
    fn deliver(&self, session: SessionId, event: &ChangeEvent) -> WatchResult<()> {
        if self.fail {
            return Err(WatchError::Delivery {
                session,
                reason: "connection reset".into(),
            });
        }
        self.delivered.lock().push((session, event.clone()));
        Ok(())
    }
}

pub fn event(revision: u64, dn: &str) -> ChangeEvent {
    ChangeEvent::new(revision, dn, ChangeKind::Add)
}

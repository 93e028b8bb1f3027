//! Background worker handling guestboard I/O.

use crate::guestboard::{
    GuestNote, NewNote,
    geocode::{Coordinates, Geocoder},
    store::NoteStore,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Fetch every note, newest first.
    LoadNotes,
    /// Persist a note the visitor just placed.
    AddNote(NewNote),
    /// Reverse geocode the visitor position.
    ResolveCity(Coordinates),
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// `None` when the fetch failed.
    NotesLoaded(Option<Vec<GuestNote>>),
    /// Store id of the written note, `None` on failure.
    NoteAdded(Option<String>),
    /// City of the visitor, `None` when unknown.
    CityResolved(Option<String>),
    /// Informational log message.
    Log(String),
}

/// Main worker loop: handle commands sequentially until the UI hangs up.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    store: Arc<dyn NoteStore>,
    geocoder: Arc<dyn Geocoder>,
) {
    tracing::info!("worker started");

    while let Some(cmd) = rx.recv().await {
        // Every command produces exactly one outcome event.
        let event = match cmd {
            WorkerCmd::LoadNotes => match store.list_notes().await {
                Ok(notes) => {
                    tracing::info!("loaded {} notes", notes.len());
                    WorkerEvent::NotesLoaded(Some(notes))
                }
                Err(e) => {
                    // The board shows an empty list rather than waiting forever.
                    tracing::error!("error loading notes: {e}");
                    let _ = tx.send(WorkerEvent::Log(format!("error loading notes: {e}"))).await;
                    WorkerEvent::NotesLoaded(None)
                }
            },

            WorkerCmd::AddNote(note) => match store.add_note(&note).await {
                Ok(id) => {
                    tracing::info!("note saved: {id}");
                    WorkerEvent::NoteAdded(Some(id))
                }
                Err(e) => {
                    // The note stays on the board locally.
                    tracing::error!("error saving note: {e}");
                    let _ = tx.send(WorkerEvent::Log(format!("error saving note: {e}"))).await;
                    WorkerEvent::NoteAdded(None)
                }
            },

            WorkerCmd::ResolveCity(at) => match geocoder.city_for(at).await {
                Ok(city) => {
                    tracing::info!("visitor city: {city:?}");
                    WorkerEvent::CityResolved(city)
                }
                Err(e) => {
                    // Without a city the visitor simply cannot place a note.
                    tracing::warn!("error getting location: {e}");
                    WorkerEvent::CityResolved(None)
                }
            },
        };

        // The UI dropped its receiver: shut down.
        if tx.send(event).await.is_err() {
            break;
        }
    }
    tracing::info!("worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guestboard::NotePosition;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        notes: Mutex<Vec<GuestNote>>,
    }

    #[async_trait]
    impl NoteStore for MemoryStore {
        async fn add_note(&self, note: &NewNote) -> Result<String> {
            let mut notes = self.notes.lock().unwrap();
            let id = format!("n{}", notes.len());
            notes.push(GuestNote {
                id: id.clone(),
                name: note.name.clone(),
                city: note.city.clone(),
                message: note.message.clone(),
                date: Utc::now(),
                position: note.position,
            });
            Ok(id)
        }

        async fn list_notes(&self) -> Result<Vec<GuestNote>> {
            let mut notes = self.notes.lock().unwrap().clone();
            notes.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(notes)
        }
    }

    struct FailingStore;

    #[async_trait]
    impl NoteStore for FailingStore {
        async fn add_note(&self, _note: &NewNote) -> Result<String> {
            Err(anyhow!("HTTP status 403 Forbidden error: denied"))
        }

        async fn list_notes(&self) -> Result<Vec<GuestNote>> {
            Err(anyhow!("HTTP status 503 Service Unavailable error: down"))
        }
    }

    struct FixedGeocoder(Option<&'static str>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn city_for(&self, _at: Coordinates) -> Result<Option<String>> {
            match self.0 {
                Some(c) => Ok(Some(c.to_string())),
                None => Err(anyhow!("timeout")),
            }
        }
    }

    fn spawn(
        store: Arc<dyn NoteStore>,
        geocoder: Arc<dyn Geocoder>,
    ) -> (mpsc::Sender<WorkerCmd>, mpsc::Receiver<WorkerEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (evt_tx, evt_rx) = mpsc::channel(8);
        tokio::spawn(run(cmd_rx, evt_tx, store, geocoder));
        (cmd_tx, evt_rx)
    }

    /// Next non-log event.
    async fn outcome(rx: &mut mpsc::Receiver<WorkerEvent>) -> Option<WorkerEvent> {
        loop {
            match rx.recv().await {
                Some(WorkerEvent::Log(_)) => continue,
                other => return other,
            }
        }
    }

    fn note() -> NewNote {
        NewNote {
            name: "".into(),
            city: "Davis".into(),
            message: "Hailing from Davis".into(),
            position: NotePosition { x: 1.0, y: 2.0 },
        }
    }

    #[tokio::test]
    async fn add_then_load() {
        let (tx, mut rx) = spawn(
            Arc::new(MemoryStore::default()),
            Arc::new(FixedGeocoder(Some("Davis"))),
        );

        tx.send(WorkerCmd::AddNote(note())).await.unwrap();
        let Some(WorkerEvent::NoteAdded(Some(id))) = outcome(&mut rx).await else {
            panic!("expected NoteAdded");
        };
        assert_eq!(id, "n0");

        tx.send(WorkerCmd::LoadNotes).await.unwrap();
        let Some(WorkerEvent::NotesLoaded(Some(notes))) = outcome(&mut rx).await else {
            panic!("expected NotesLoaded");
        };
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "Hailing from Davis");

        tx.send(WorkerCmd::ResolveCity(Coordinates {
            latitude: 38.5,
            longitude: -121.7,
        }))
        .await
        .unwrap();
        assert!(matches!(
            outcome(&mut rx).await,
            Some(WorkerEvent::CityResolved(Some(c))) if c == "Davis"
        ));
    }

    #[tokio::test]
    async fn failures_degrade_to_empty_outcomes() {
        let (tx, mut rx) = spawn(Arc::new(FailingStore), Arc::new(FixedGeocoder(None)));

        tx.send(WorkerCmd::LoadNotes).await.unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(WorkerEvent::Log(m)) if m.contains("503")
        ));
        assert!(matches!(rx.recv().await, Some(WorkerEvent::NotesLoaded(None))));

        tx.send(WorkerCmd::AddNote(note())).await.unwrap();
        assert!(matches!(outcome(&mut rx).await, Some(WorkerEvent::NoteAdded(None))));

        tx.send(WorkerCmd::ResolveCity(Coordinates {
            latitude: 0.0,
            longitude: 0.0,
        }))
        .await
        .unwrap();
        assert!(matches!(outcome(&mut rx).await, Some(WorkerEvent::CityResolved(None))));
    }

    #[tokio::test]
    async fn worker_stops_when_ui_hangs_up() {
        let (tx, rx) = spawn(
            Arc::new(MemoryStore::default()),
            Arc::new(FixedGeocoder(Some("x"))),
        );
        drop(rx);
        let _ = tx.send(WorkerCmd::LoadNotes).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(tx.is_closed());
    }
}

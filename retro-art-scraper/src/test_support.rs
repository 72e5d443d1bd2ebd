//! Fakes for the transport and storage seams.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use retro_art_lib::RomEntry;
use tokio::time::Duration;

use crate::client::{ApiResponse, GameQuery, SearchApi};
use crate::error::ScrapeError;
use crate::media::ArtworkCategory;
use crate::store::ArtworkStore;

type Responder = Box<dyn Fn(&GameQuery, usize) -> ApiResponse + Send + Sync>;

/// Search API answering from a script, recording every query.
pub struct ScriptedApi {
    responder: Responder,
    user_info: ApiResponse,
    latency: Duration,
    queries: Mutex<Vec<GameQuery>>,
    calls: AtomicUsize,
}

impl ScriptedApi {
    /// Answer calls in order; once the script runs out, answer 404.
    pub fn new(script: Vec<ApiResponse>) -> Self {
        Self::from_fn(move |_, i| script.get(i).cloned().unwrap_or_else(|| not_found()))
    }

    pub fn always(resp: ApiResponse) -> Self {
        Self::from_fn(move |_, _| resp.clone())
    }

    pub fn from_fn(f: impl Fn(&GameQuery, usize) -> ApiResponse + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(f),
            user_info: ApiResponse::new(200, r#"{"response":{"ssuser":{"id":"tester","maxthreads":"2"}}}"#),
            latency: Duration::ZERO,
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_user_info(mut self, resp: ApiResponse) -> Self {
        self.user_info = resp;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<GameQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for ScriptedApi {
    async fn game_info(&self, query: &GameQuery) -> Result<ApiResponse, ScrapeError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok((self.responder)(query, index))
    }

    async fn user_info(&self) -> Result<ApiResponse, ScrapeError> {
        Ok(self.user_info.clone())
    }
}

pub fn not_found() -> ApiResponse {
    ApiResponse::new(404, "")
}

/// A 200 game envelope with `(type, region, url)` media entries.
pub fn game_found(id: &str, medias: &[(&str, &str, &str)]) -> ApiResponse {
    let medias: Vec<_> = medias
        .iter()
        .map(|(t, r, u)| serde_json::json!({"type": t, "region": r, "url": u, "format": "png"}))
        .collect();
    let body = serde_json::json!({
        "response": {"jeu": {"id": id, "noms": [{"region": "us", "text": id}], "medias": medias}}
    });
    ApiResponse::new(200, body.to_string())
}

/// A game offering every artwork category in the us region.
pub fn full_game(id: &str) -> ApiResponse {
    game_found(
        id,
        &[
            ("box-2D", "us", "https://cdn/box.png"),
            ("wheel-hd", "us", "https://cdn/wheel.png"),
            ("ss", "us", "https://cdn/ss.png"),
        ],
    )
}

/// In-memory artwork store. Saved artwork counts as present afterwards.
#[derive(Default)]
pub struct MemoryStore {
    present: Mutex<HashSet<(String, String, ArtworkCategory)>>,
    failing: HashSet<ArtworkCategory>,
    saves: Mutex<Vec<(String, ArtworkCategory)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(self, system: &str, game: &str, category: ArtworkCategory) -> Self {
        self.present
            .lock()
            .unwrap()
            .insert((system.to_string(), game.to_string(), category));
        self
    }

    pub fn with_all_existing(self, system: &str, game: &str) -> Self {
        ArtworkCategory::ALL
            .iter()
            .fold(self, |s, &c| s.with_existing(system, game, c))
    }

    pub fn failing_on(mut self, category: ArtworkCategory) -> Self {
        self.failing.insert(category);
        self
    }

    /// `(url, category)` of every successful save.
    pub fn saves(&self) -> Vec<(String, ArtworkCategory)> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtworkStore for MemoryStore {
    async fn exists(&self, system_folder: &str, game: &str, category: ArtworkCategory) -> bool {
        self.present.lock().unwrap().contains(&(
            system_folder.to_string(),
            game.to_string(),
            category,
        ))
    }

    async fn save(
        &self,
        url: &str,
        system_folder: &str,
        game: &str,
        category: ArtworkCategory,
    ) -> bool {
        if self.failing.contains(&category) {
            return false;
        }
        self.present.lock().unwrap().insert((
            system_folder.to_string(),
            game.to_string(),
            category,
        ));
        self.saves.lock().unwrap().push((url.to_string(), category));
        true
    }
}

/// A ROM whose file does not exist on disk.
pub fn rom(system: &str, name: &str) -> RomEntry {
    RomEntry {
        name: name.to_string(),
        path: PathBuf::from("/nonexistent").join(system).join(name),
        size: 0,
        system_folder: system.to_string(),
    }
}

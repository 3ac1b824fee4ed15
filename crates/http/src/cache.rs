//! In-memory copies of the three record lists.

use crate::client::FarmClient;
use birdbook_core::{Bird, Chick, FarmResult, FarmStats, Pair};

/// The three lists as last fetched, plus the status line.
#[derive(Debug, Clone, Default)]
pub struct DataCache {
    pub birds: Vec<Bird>,
    pub pairs: Vec<Pair>,
    pub chicks: Vec<Chick>,
    /// Status shown to the user, if any.
    pub message: Option<String>,
}

impl DataCache {
    /// Replace all three lists with fresh copies from the server.
    ///
    /// The requests run concurrently. A list whose request fails becomes
    /// empty; the message is set only when all three fail.
    pub async fn fetch_all(&mut self, client: &FarmClient) {
        self.message = None;

        let (birds, pairs, chicks) = futures::join!(
            client.list::<Bird>(),
            client.list::<Pair>(),
            client.list::<Chick>()
        );

        let all_failed = birds.is_err() && pairs.is_err() && chicks.is_err();

        self.birds = settle("birds", birds);
        self.pairs = settle("pairs", pairs);
        self.chicks = settle("chicks", chicks);

        if all_failed {
            self.message = Some(format!(
                "โหลดข้อมูลไม่สำเร็จทั้ง 3 รายการ · ตรวจสอบว่า bird-api รันอยู่ที่ {}",
                client.base_url()
            ));
        }
    }

    /// Aggregate counts over the cached lists.
    pub fn stats(&self) -> FarmStats {
        FarmStats::compute(&self.birds, &self.pairs, &self.chicks)
    }

    pub fn bird(&self, id: &str) -> Option<&Bird> {
        self.birds.iter().find(|b| b.bird_id == id)
    }

    pub fn pair(&self, id: &str) -> Option<&Pair> {
        self.pairs.iter().find(|p| p.pair_id == id)
    }

    pub fn chick(&self, id: &str) -> Option<&Chick> {
        self.chicks.iter().find(|c| c.chick_id == id)
    }
}

fn settle<T>(resource: &str, result: FarmResult<Vec<T>>) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(resource, error = %e, "fetch failed");
            Vec::new()
        }
    }
}

//! The editing session: cached lists, one form per record type, and the
//! save and delete flows that tie them to the API.

use crate::cache::DataCache;
use crate::client::FarmClient;
use crate::form::FormState;
use birdbook_core::{Bird, Chick, FarmResult, Pair, Record};
use std::fmt;

/// One of the three record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Birds,
    Pairs,
    Chicks,
}

impl Resource {
    /// Name used in delete messages.
    pub fn noun(self) -> &'static str {
        match self {
            Resource::Birds => "นก",
            Resource::Pairs => "คู่ผสม",
            Resource::Chicks => "ลูกนก",
        }
    }

    /// Name used when editing or saving the form; birds read "bird data".
    pub fn form_noun(self) -> &'static str {
        match self {
            Resource::Birds => "ข้อมูลนก",
            other => other.noun(),
        }
    }

    /// Question asked before deleting the record labelled `label`.
    pub fn delete_prompt(self, label: &str) -> String {
        match self {
            Resource::Birds => format!("ต้องการลบนกรหัส {label} ใช่ไหม?"),
            other => format!("ต้องการลบ{} {label} ใช่ไหม?", other.noun()),
        }
    }

    /// REST path segment.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Birds => Bird::RESOURCE,
            Resource::Pairs => Pair::RESOURCE,
            Resource::Chicks => Chick::RESOURCE,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Status shown after a failed save.
pub const SAVE_FAILED: &str = "เกิดข้อผิดพลาดในการบันทึก · ดู log ใน terminal ของ bird-api";

pub struct Workspace {
    client: FarmClient,
    pub cache: DataCache,
    pub birds: FormState<Bird>,
    pub pairs: FormState<Pair>,
    pub chicks: FormState<Chick>,
    saving: bool,
}

impl Workspace {
    pub fn new(client: FarmClient) -> Self {
        Self {
            client,
            cache: DataCache::default(),
            birds: FormState::new(),
            pairs: FormState::new(),
            chicks: FormState::new(),
            saving: false,
        }
    }

    pub fn client(&self) -> &FarmClient {
        &self.client
    }

    /// Current status line.
    pub fn message(&self) -> Option<&str> {
        self.cache.message.as_deref()
    }

    /// Whether a save is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Fetch all three lists.
    pub async fn load(&mut self) {
        self.cache.fetch_all(&self.client).await;
    }

    /// Put the cached record `id` into its form for editing.
    ///
    /// Returns `false` when no such record is cached.
    pub fn edit(&mut self, resource: Resource, id: &str) -> bool {
        let started = match resource {
            Resource::Birds => begin(&mut self.birds, self.cache.bird(id)),
            Resource::Pairs => begin(&mut self.pairs, self.cache.pair(id)),
            Resource::Chicks => begin(&mut self.chicks, self.cache.chick(id)),
        };
        if started {
            self.cache.message = Some(format!(
                "กำลังแก้ไข{} {}",
                resource.form_noun(),
                self.label(resource, id)
            ));
        }
        started
    }

    /// Submit the form for `resource`: update when editing, create otherwise.
    ///
    /// On success the form is reset and every list is refetched. Returns
    /// whether the save went through; failures only set the status line.
    pub async fn save(&mut self, resource: Resource) -> bool {
        if self.saving {
            return false;
        }
        self.saving = true;
        self.cache.message = None;

        let noun = resource.form_noun();
        let outcome = match resource {
            Resource::Birds => submit(&self.client, &mut self.birds, noun).await,
            Resource::Pairs => submit(&self.client, &mut self.pairs, noun).await,
            Resource::Chicks => submit(&self.client, &mut self.chicks, noun).await,
        };

        let saved = match outcome {
            Ok(message) => {
                self.refresh_with(message).await;
                true
            }
            Err(e) => {
                tracing::error!(resource = %resource, error = %e, "save failed");
                self.cache.message = Some(SAVE_FAILED.to_string());
                false
            }
        };

        self.saving = false;
        saved
    }

    /// Delete record `id` after the user confirms.
    ///
    /// Returns `false` without calling the API when the id is blank or the
    /// user declines.
    pub async fn delete(&mut self, resource: Resource, id: &str, confirm: &dyn Confirm) -> bool {
        if id.trim().is_empty() {
            return false;
        }

        let noun = resource.noun();
        let label = self.label(resource, id);
        if !confirm.confirm(&resource.delete_prompt(&label)) {
            return false;
        }

        let result = match resource {
            Resource::Birds => self.client.delete::<Bird>(id).await,
            Resource::Pairs => self.client.delete::<Pair>(id).await,
            Resource::Chicks => self.client.delete::<Chick>(id).await,
        };

        match result {
            Ok(()) => {
                self.refresh_with(format!("ลบ{noun} {label} สำเร็จ ✓")).await;
                true
            }
            Err(e) => {
                tracing::error!(resource = %resource, id, error = %e, "delete failed");
                self.cache.message = Some(format!("ลบ{noun}ไม่สำเร็จ · ตรวจสอบ server"));
                false
            }
        }
    }

    /// Ring number when there is one, else the id.
    fn label(&self, resource: Resource, id: &str) -> String {
        let ring = match resource {
            Resource::Birds => self.cache.bird(id).map(|b| b.ring_no.as_str()),
            Resource::Chicks => self.cache.chick(id).map(|c| c.ring_no.as_str()),
            Resource::Pairs => None,
        };
        ring.filter(|r| !r.is_empty()).unwrap_or(id).to_string()
    }

    /// Refetch everything, then show `message` unless loading failed outright.
    async fn refresh_with(&mut self, message: String) {
        self.cache.fetch_all(&self.client).await;
        if self.cache.message.is_none() {
            self.cache.message = Some(message);
        }
    }
}

fn begin<R: Record>(form: &mut FormState<R>, record: Option<&R>) -> bool {
    record.is_some_and(|r| form.begin_edit(r))
}

async fn submit<R: Record>(
    client: &FarmClient,
    form: &mut FormState<R>,
    noun: &str,
) -> FarmResult<String> {
    let message = match form.editing() {
        Some(id) => {
            client.update::<R>(id, &form.fields).await?;
            format!("แก้ไข{noun} {id} สำเร็จ ✓")
        }
        None => {
            client.create::<R>(&form.fields).await?;
            format!("บันทึก{noun}สำเร็จ ✓")
        }
    };
    form.reset();
    Ok(message)
}

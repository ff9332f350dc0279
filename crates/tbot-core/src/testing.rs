//! Hand-rolled port fakes shared by unit tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::{port::MessagingPort, types::MessagingCapabilities},
    ports::{PageRequest, TenderSource},
    tender::{
        Address, Classification, LineItem, PageCursor, ProcuringEntity, TenderPage, TenderRecord,
        TenderSummary,
    },
    Error, Result,
};

pub(crate) fn tender(id: &str, status: &str, cpv: &str, region: &str) -> TenderRecord {
    TenderRecord {
        id: id.to_string(),
        title: Some(format!("Tender {id}")),
        status: Some(status.to_string()),
        items: vec![LineItem {
            classification: Some(Classification {
                id: Some(cpv.to_string()),
                scheme: None,
            }),
        }],
        procuring_entity: Some(ProcuringEntity {
            name: Some("Школа".to_string()),
            identifier: None,
            address: Some(Address {
                region: Some(region.to_string()),
                locality: None,
            }),
        }),
        ..Default::default()
    }
}

pub(crate) fn page(ids: &[&str], next: Option<&str>) -> TenderPage {
    TenderPage {
        data: ids
            .iter()
            .map(|id| TenderSummary {
                id: id.to_string(),
                date_modified: None,
            })
            .collect(),
        next: next.map(|s| PageCursor(s.to_string())),
    }
}

enum PageOutcome {
    Ok(TenderPage),
    Fail,
}

/// Registry fake keyed by offset (`None` = first page).
#[derive(Default)]
pub(crate) struct FakeSource {
    pages: HashMap<Option<String>, PageOutcome>,
    details: HashMap<String, TenderRecord>,
    page_calls: Mutex<Vec<PageRequest>>,
    detail_calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, offset: Option<&str>, page: TenderPage) -> Self {
        self.pages
            .insert(offset.map(str::to_string), PageOutcome::Ok(page));
        self
    }

    pub(crate) fn with_failing_page(mut self, offset: Option<&str>) -> Self {
        self.pages.insert(offset.map(str::to_string), PageOutcome::Fail);
        self
    }

    pub(crate) fn with_tender(mut self, record: TenderRecord) -> Self {
        self.details.insert(record.id.clone(), record);
        self
    }

    pub(crate) fn page_calls(&self) -> Vec<PageRequest> {
        self.page_calls.lock().unwrap().clone()
    }

    pub(crate) fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TenderSource for FakeSource {
    async fn fetch_page(&self, req: &PageRequest) -> Result<TenderPage> {
        self.page_calls.lock().unwrap().push(req.clone());
        let key = req.offset.as_ref().map(|c| c.as_str().to_string());
        match self.pages.get(&key) {
            Some(PageOutcome::Ok(p)) => Ok(p.clone()),
            Some(PageOutcome::Fail) => Err(Error::Http {
                status: 503,
                body: "unavailable".to_string(),
            }),
            None => Err(Error::Http {
                status: 404,
                body: "no such page".to_string(),
            }),
        }
    }

    async fn fetch_tender(&self, id: &str) -> Result<TenderRecord> {
        self.detail_calls.lock().unwrap().push(id.to_string());
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Network(format!("connection reset fetching {id}")))
    }
}

/// Messenger fake that records sends and can reject texts containing a marker.
#[derive(Default)]
pub(crate) struct FakeMessenger {
    next_id: Mutex<i32>,
    sent: Mutex<Vec<(ChatId, String)>>,
    reject_marker: Option<String>,
    max_len: Option<usize>,
}

impl FakeMessenger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting(marker: &str) -> Self {
        Self {
            reject_marker: Some(marker.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Default::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: self.max_len.unwrap_or(4096),
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        if let Some(marker) = &self.reject_marker {
            if text.contains(marker.as_str()) {
                return Err(Error::Dispatch("chat not found".to_string()));
            }
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(*guard),
        })
    }
}

// Recording in-memory `Transport` for controller and resolver tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;

use nsot_core::{ObjectId, Params, SiteId, Transport};

/// One call the code under test made.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get { path: String, params: Params },
    GetById { path: String, id: ObjectId },
    Post { path: String, payload: Value },
    Put { path: String, id: ObjectId, payload: Value },
    Delete { path: String, id: ObjectId },
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Post { .. } | Self::Put { .. } | Self::Delete { .. })
    }
}

/// Answers calls from a FIFO queue, `null` once the queue runs dry.
#[derive(Default)]
pub struct FakeTransport {
    default_site: Option<SiteId>,
    responses: RefCell<VecDeque<Result<Value, nsot_api::Error>>>,
    calls: RefCell<Vec<Call>>,
}

impl FakeTransport {
    pub fn new(default_site: Option<SiteId>) -> Self {
        Self {
            default_site,
            ..Self::default()
        }
    }

    pub fn respond(&self, response: Value) -> &Self {
        self.responses.borrow_mut().push_back(Ok(response));
        self
    }

    pub fn fail(&self, err: nsot_api::Error) -> &Self {
        self.responses.borrow_mut().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn answer(&self, call: Call) -> Result<Value, nsot_api::Error> {
        self.calls.borrow_mut().push(call);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

impl Transport for FakeTransport {
    fn get(&self, path: &str, params: &Params) -> Result<Value, nsot_api::Error> {
        self.answer(Call::Get {
            path: path.into(),
            params: params.clone(),
        })
    }

    fn get_by_id(&self, path: &str, id: ObjectId) -> Result<Value, nsot_api::Error> {
        self.answer(Call::GetById {
            path: path.into(),
            id,
        })
    }

    fn post(&self, path: &str, payload: &Value) -> Result<Value, nsot_api::Error> {
        self.answer(Call::Post {
            path: path.into(),
            payload: payload.clone(),
        })
    }

    fn put(&self, path: &str, id: ObjectId, payload: &Value) -> Result<Value, nsot_api::Error> {
        self.answer(Call::Put {
            path: path.into(),
            id,
            payload: payload.clone(),
        })
    }

    fn delete(&self, path: &str, id: ObjectId) -> Result<Value, nsot_api::Error> {
        self.answer(Call::Delete {
            path: path.into(),
            id,
        })
    }

    fn default_site(&self) -> Option<SiteId> {
        self.default_site
    }
}

/// Build `Params` from a `json!` object literal.
pub fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

pub fn api_error(status: u16, message: &str) -> nsot_api::Error {
    nsot_api::Error::Api {
        status,
        code: Some(status.to_string()),
        message: message.into(),
    }
}

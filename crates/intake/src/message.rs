//! Application error codes with localized texts.
//!
//! A [`Message`] ties an application error code to a status and per-language texts, and may
//! carry a callback that renders it instead of the plain text default. [`Messages`] is the
//! table the application registers them in.

use crate::response::ResponseWriter;
use crate::status::StatusHandlers;
use crate::Request;
use arc_swap::ArcSwap;
use http::StatusCode;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Lang {
    #[default]
    En,
    Zh,
}

#[derive(Debug, Error)]
#[error("unknown language tag `{0}`")]
pub struct UnknownLang(String);

impl FromStr for Lang {
    type Err = UnknownLang;

    /// Accepts primary tags like `en`, `zh` and regional ones like `zh-CN`
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let primary = tag.split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("en") {
            Ok(Lang::En)
        } else if primary.eq_ignore_ascii_case("zh") {
            Ok(Lang::Zh)
        } else {
            Err(UnknownLang(tag.to_owned()))
        }
    }
}

pub trait MessageCallback: Send + Sync {
    fn call(&self, req: &mut Request, resp: &mut ResponseWriter, message: &Message, payload: &Value);
}

impl<F> MessageCallback for F
where
    F: Fn(&mut Request, &mut ResponseWriter, &Message, &Value) + Send + Sync,
{
    fn call(&self, req: &mut Request, resp: &mut ResponseWriter, message: &Message, payload: &Value) {
        (self)(req, resp, message, payload);
    }
}

#[derive(Clone)]
pub struct Message {
    status: StatusCode,
    code: u32,
    texts: BTreeMap<Lang, String>,
    callback: Option<Arc<dyn MessageCallback>>,
}

impl Message {
    /// `code` 0 means the message carries no application error code
    pub fn new(status: StatusCode, code: u32) -> Self {
        Self { status, code, texts: BTreeMap::new(), callback: None }
    }

    pub fn with_text(mut self, lang: Lang, text: impl Into<String>) -> Self {
        self.texts.insert(lang, text.into());
        self
    }

    pub fn with_callback(mut self, callback: impl MessageCallback + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn text(&self, lang: Lang) -> Option<&str> {
        self.texts.get(&lang).map(String::as_str)
    }

    /// The text in `lang`, falling back to English, then any text, then the status reason
    pub fn render_text(&self, lang: Lang) -> &str {
        self.text(lang)
            .or_else(|| self.text(Lang::En))
            .or_else(|| self.texts.values().next().map(String::as_str))
            .or_else(|| self.status.canonical_reason())
            .unwrap_or_default()
    }

    pub fn callback(&self) -> Option<&Arc<dyn MessageCallback>> {
        self.callback.as_ref()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("status", &self.status)
            .field("code", &self.code)
            .field("texts", &self.texts)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

pub struct Messages {
    table: ArcSwap<HashMap<u32, Arc<Message>>>,
    default_lang: ArcSwap<Lang>,
}

impl Messages {
    pub fn new() -> Self {
        Self { table: ArcSwap::from_pointee(HashMap::new()), default_lang: ArcSwap::from_pointee(Lang::default()) }
    }

    /// Registers `message` under its code, returning the message it replaced
    pub fn register(&self, message: Message) -> Option<Arc<Message>> {
        let code = message.code;
        let message = Arc::new(message);
        let mut replaced = None;
        self.table.rcu(|table| {
            let mut table = HashMap::clone(table);
            replaced = table.insert(code, Arc::clone(&message));
            table
        });
        replaced
    }

    pub fn unregister(&self, code: u32) -> Option<Arc<Message>> {
        let mut removed = None;
        self.table.rcu(|table| {
            let mut table = HashMap::clone(table);
            removed = table.remove(&code);
            table
        });
        removed
    }

    pub fn lookup(&self, code: u32) -> Option<Arc<Message>> {
        self.table.load().get(&code).cloned()
    }

    pub fn default_lang(&self) -> Lang {
        **self.default_lang.load()
    }

    pub fn set_default_lang(&self, lang: Lang) {
        self.default_lang.store(Arc::new(lang));
    }

    /// Renders the message registered under `code`.
    ///
    /// The message's own callback wins, otherwise its text is rendered at its status through
    /// `statuses`, so status overrides apply. Returns false when nothing is registered.
    pub fn dispatch(
        &self,
        statuses: &StatusHandlers,
        code: u32,
        req: &mut Request,
        resp: &mut ResponseWriter,
        payload: &Value,
    ) -> bool {
        let Some(message) = self.lookup(code) else {
            debug!(code, "no message registered for code");
            return false;
        };

        match message.callback() {
            Some(callback) => callback.call(req, resp, &message, payload),
            None => statuses.respond(req, resp, &message, self.default_lang()),
        }
        true
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Messages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messages")
            .field("codes", &self.table.load().len())
            .field("default_lang", &self.default_lang())
            .finish()
    }
}

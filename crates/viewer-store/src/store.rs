//! Central store
//!
//! Holds the state behind a `RefCell`. Actions (in `document`, `files` and
//! `signature`) read it freely but change it only through `commit`. The
//! opened document handle is kept beside the state: it is a resource for
//! rendering, not data the UI observes.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use viewer_core::{RenderEngine, Transport};

use crate::config::StoreConfig;
use crate::mutation::Mutation;
use crate::state::StoreState;

pub struct Store<E: RenderEngine, T: Transport> {
    pub(crate) engine: E,
    pub(crate) transport: T,
    pub(crate) config: StoreConfig,
    state: RefCell<StoreState>,
    pub(crate) document: RefCell<Option<Rc<E::Document>>>,
}

impl<E: RenderEngine, T: Transport> Store<E, T> {
    pub fn new(engine: E, transport: T, config: StoreConfig) -> Self {
        let state = StoreState::from_config(&config);
        Self {
            engine,
            transport,
            config,
            state: RefCell::new(state),
            document: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Borrow the current state; do not hold the guard across a `commit`
    pub fn state(&self) -> Ref<'_, StoreState> {
        self.state.borrow()
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn commit(&self, mutation: Mutation) {
        tracing::trace!("commit {}", mutation.name());
        mutation.apply(&mut self.state.borrow_mut());
    }

    pub fn has_document(&self) -> bool {
        self.document.borrow().is_some()
    }
}

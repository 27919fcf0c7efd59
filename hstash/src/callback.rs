//! Completion-closure variants of the store operations.
//!
//! Each `*_then` method spawns the operation on the store's runtime, returns
//! the store for chaining, and calls `done` exactly once with the outcome.
//! Validation failures are delivered through `done` like any other error.

use std::future::Future;

use hstash_common::StashResult;

use crate::args::Arg;
use crate::store::{HashStore, ReadReply};

impl HashStore {
    fn complete<T, Fut, F>(&self, operation: Fut, done: F) -> &Self
    where
        T: Send + 'static,
        Fut: Future<Output = StashResult<T>> + Send + 'static,
        F: FnOnce(StashResult<T>) + Send + 'static,
    {
        self.runtime().spawn(async move { done(operation.await) });
        self
    }

    pub fn read_then<F>(&self, args: Vec<Arg>, done: F) -> &Self
    where
        F: FnOnce(StashResult<ReadReply>) + Send + 'static,
    {
        let store = self.clone();
        self.complete(async move { store.read(args).await }, done)
    }

    pub fn write_then<F>(&self, args: Vec<Arg>, done: F) -> &Self
    where
        F: FnOnce(StashResult<()>) + Send + 'static,
    {
        let store = self.clone();
        self.complete(async move { store.write(args).await }, done)
    }

    pub fn exists_then<F>(&self, args: Vec<Arg>, done: F) -> &Self
    where
        F: FnOnce(StashResult<bool>) + Send + 'static,
    {
        let store = self.clone();
        self.complete(async move { store.exists(args).await }, done)
    }

    pub fn delete_then<F>(&self, args: Vec<Arg>, done: F) -> &Self
    where
        F: FnOnce(StashResult<()>) + Send + 'static,
    {
        let store = self.clone();
        self.complete(async move { store.delete(args).await }, done)
    }

    pub fn list_fields_then<F>(&self, args: Vec<Arg>, done: F) -> &Self
    where
        F: FnOnce(StashResult<Vec<String>>) + Send + 'static,
    {
        let store = self.clone();
        self.complete(async move { store.list_fields(args).await }, done)
    }

    pub fn search_keys_then<F>(&self, args: Vec<Arg>, done: F) -> &Self
    where
        F: FnOnce(StashResult<Vec<String>>) + Send + 'static,
    {
        let store = self.clone();
        self.complete(async move { store.search_keys(args).await }, done)
    }

    pub fn clear_then<F>(&self, args: Vec<Arg>, done: F) -> &Self
    where
        F: FnOnce(StashResult<()>) + Send + 'static,
    {
        let store = self.clone();
        self.complete(async move { store.clear(args).await }, done)
    }
}

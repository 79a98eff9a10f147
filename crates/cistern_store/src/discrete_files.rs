// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! File-backed storage, one file per entry.
//!
//! Two flavors with the same layout but different lifetimes:
//!
//! - [`DiscreteFileStoreVolatile`] clears its cache directory on
//!   construction. The directory is scratch space; nothing survives a
//!   restart.
//! - [`DiscreteFileStoreNonVolatile`] keeps surviving files and rebuilds
//!   its key index from them, so a warm cache outlives the process.
//!   Before reaching for this, consider whether you really need to
//!   rehydrate without hitting the source of record: you give up
//!   restart-clears-corruption, and you take on schema compatibility
//!   across versions of your application.
//!
//! Entries are serialized through a [`FileCodec`]; JSON and bincode codecs
//! are provided. Cache files are named with random v4 UUIDs; the key to
//! path mapping lives in the in-memory index (and, for the non-volatile
//! flavor, inside each file's record).
//!
//! Read and write failures follow the storage contract: reads degrade to
//! `None`, writes are tolerated, both with a warning. Only construction is
//! fallible.

use std::collections::HashMap;
use std::fs::{self, File};
use std::hash::Hash;
use std::io::{BufReader, BufWriter};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::CacheStore;

/// Selects the on-disk serialization format for a discrete-file store.
///
/// Buffered handles are used throughout: a store that went to disk either
/// holds large values or does not care about the syscall count, and
/// buffering is the right default for both.
pub trait FileCodec<T> {
    /// Writes a value, returning false if serialization or I/O failed.
    fn serialize(writer: BufWriter<File>, value: &T) -> bool;

    /// Reads a value back, or `None` if the file could not be decoded.
    fn deserialize(reader: BufReader<File>) -> Option<T>;
}

/// Human-readable JSON serialization.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec;

impl<T> FileCodec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(writer: BufWriter<File>, value: &T) -> bool {
        serde_json::to_writer(writer, value).is_ok()
    }

    fn deserialize(reader: BufReader<File>) -> Option<T> {
        serde_json::from_reader(reader).ok()
    }
}

/// Compact binary serialization.
#[derive(Debug, Clone, Copy)]
pub struct BincodeCodec;

impl<T> FileCodec<T> for BincodeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(writer: BufWriter<File>, value: &T) -> bool {
        bincode::serialize_into(writer, value).is_ok()
    }

    fn deserialize(reader: BufReader<File>) -> Option<T> {
        bincode::deserialize_from(reader).ok()
    }
}

/// The record a non-volatile store writes per entry, carrying the key so
/// the index can be rebuilt by scanning the directory.
#[derive(Debug, Serialize, Deserialize)]
pub struct Record<K, V> {
    key: K,
    value: V,
}

/// A file-per-entry store whose directory is cleared on construction.
pub struct DiscreteFileStoreVolatile<K, V, C> {
    cache_directory: PathBuf,
    index: HashMap<K, PathBuf>,
    _codec: PhantomData<fn() -> (V, C)>,
}

impl<K, V, C> DiscreteFileStoreVolatile<K, V, C>
where
    K: Eq + Hash,
{
    /// Creates the store, deleting any previous contents of the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created.
    pub fn new(cache_directory: impl Into<PathBuf>) -> Result<Self> {
        let cache_directory = cache_directory.into();

        // Previous contents are by definition garbage for a volatile store.
        let _ = fs::remove_dir_all(&cache_directory);
        fs::create_dir_all(&cache_directory).map_err(|source| Error::CacheDirectory {
            path: cache_directory.clone(),
            source,
        })?;

        Ok(Self {
            cache_directory,
            index: HashMap::new(),
            _codec: PhantomData,
        })
    }
}

impl<K, V, C> CacheStore<K, V> for DiscreteFileStoreVolatile<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Serialize + DeserializeOwned,
    C: FileCodec<V>,
{
    fn get(&self, key: &K) -> Option<V> {
        read_file::<C, V>(self.index.get(key)?)
    }

    fn set(&mut self, key: K, value: V) {
        let path = index_path(&self.cache_directory, &mut self.index, key);
        write_file::<C, V>(&path, &value);
    }

    fn delete(&mut self, key: &K) -> bool {
        remove_entry(&mut self.index, key)
    }

    fn flush(&mut self) {
        for (_, path) in self.index.drain() {
            remove_file(&path);
        }
    }
}

/// A file-per-entry store that rebuilds its index from surviving files.
pub struct DiscreteFileStoreNonVolatile<K, V, C> {
    cache_directory: PathBuf,
    index: HashMap<K, PathBuf>,
    _codec: PhantomData<fn() -> (V, C)>,
}

impl<K, V, C> DiscreteFileStoreNonVolatile<K, V, C>
where
    K: Eq + Hash + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
    C: FileCodec<Record<K, V>>,
{
    /// Creates the store, indexing whatever decodable entries already exist
    /// in the directory. Files that fail to decode are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or read.
    pub fn new(cache_directory: impl Into<PathBuf>) -> Result<Self> {
        let cache_directory = cache_directory.into();

        fs::create_dir_all(&cache_directory).map_err(|source| Error::CacheDirectory {
            path: cache_directory.clone(),
            source,
        })?;

        let mut index = HashMap::new();
        let entries = fs::read_dir(&cache_directory).map_err(|source| Error::CacheDirectory {
            path: cache_directory.clone(),
            source,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(record) = read_file::<C, Record<K, V>>(&path) {
                index.insert(record.key, path);
            } else {
                warn!(path = %path.display(), "skipping undecodable cache file");
            }
        }

        Ok(Self {
            cache_directory,
            index,
            _codec: PhantomData,
        })
    }
}

impl<K, V, C> CacheStore<K, V> for DiscreteFileStoreNonVolatile<K, V, C>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
    C: FileCodec<Record<K, V>>,
{
    fn get(&self, key: &K) -> Option<V> {
        read_file::<C, Record<K, V>>(self.index.get(key)?).map(|record| record.value)
    }

    fn set(&mut self, key: K, value: V) {
        let record = Record {
            key: key.clone(),
            value,
        };
        let path = index_path(&self.cache_directory, &mut self.index, key);
        write_file::<C, Record<K, V>>(&path, &record);
    }

    fn delete(&mut self, key: &K) -> bool {
        remove_entry(&mut self.index, key)
    }

    fn flush(&mut self) {
        for (_, path) in self.index.drain() {
            remove_file(&path);
        }
    }
}

/// Volatile store serializing entries as JSON.
pub type DiscreteFileStoreVolatileJson<K, V> = DiscreteFileStoreVolatile<K, V, JsonCodec>;
/// Volatile store serializing entries with bincode.
pub type DiscreteFileStoreVolatileBincode<K, V> = DiscreteFileStoreVolatile<K, V, BincodeCodec>;
/// Non-volatile store serializing records as JSON.
pub type DiscreteFileStoreNonVolatileJson<K, V> = DiscreteFileStoreNonVolatile<K, V, JsonCodec>;
/// Non-volatile store serializing records with bincode.
pub type DiscreteFileStoreNonVolatileBincode<K, V> =
    DiscreteFileStoreNonVolatile<K, V, BincodeCodec>;

fn read_file<C, T>(path: &Path) -> Option<T>
where
    C: FileCodec<T>,
{
    match File::open(path) {
        Ok(file) => C::deserialize(BufReader::new(file)),
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to open cache file");
            None
        }
    }
}

fn write_file<C, T>(path: &Path, value: &T)
where
    C: FileCodec<T>,
{
    match File::create(path) {
        Ok(file) => {
            if !C::serialize(BufWriter::new(file), value) {
                warn!(path = %path.display(), "failed to write cache file");
            }
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to create cache file");
        }
    }
}

fn remove_entry<K>(index: &mut HashMap<K, PathBuf>, key: &K) -> bool
where
    K: Eq + Hash,
{
    match index.remove(key) {
        Some(path) => fs::remove_file(path).is_ok(),
        None => false,
    }
}

fn remove_file(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        warn!(path = %path.display(), %error, "failed to remove cache file");
    }
}

fn index_path<K>(cache_directory: &Path, index: &mut HashMap<K, PathBuf>, key: K) -> PathBuf
where
    K: Eq + Hash,
{
    index
        .entry(key)
        .or_insert_with(|| cache_directory.join(Uuid::new_v4().hyphenated().to_string()))
        .clone()
}

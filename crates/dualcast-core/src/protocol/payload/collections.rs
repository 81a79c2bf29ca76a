//! Collections, maps, fixed arrays and tuples.
//!
//! Collections and maps are reference shapes: a presence byte, an i32 count,
//! then the elements (or key/value pairs) in iteration order. Tuples are
//! value shapes whose components are written in component-name order,
//! `Item1` through `Item7`, which is positional order.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use bytes::Bytes;

use crate::error::{DualcastError, Result};

use super::{read, write, Payload, PayloadReader, PayloadWriter, Shape};

fn write_seq<'a, T, I>(items: I, len: usize, w: &mut PayloadWriter)
where
    T: Payload + 'a,
    I: IntoIterator<Item = &'a T>,
{
    w.put_count(len);
    for item in items {
        write(item, w);
    }
}

fn read_seq<T, C>(r: &mut PayloadReader<'_>) -> Result<C>
where
    T: Payload,
    C: FromIterator<T>,
{
    let count = r.get_count()?;
    (0..count).map(|_| read::<T>(r)).collect()
}

fn write_map<'a, K, V, I>(entries: I, len: usize, w: &mut PayloadWriter)
where
    K: Payload + 'a,
    V: Payload + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    w.put_count(len);
    for (k, v) in entries {
        write(k, w);
        write(v, w);
    }
}

fn read_map<K, V, C>(r: &mut PayloadReader<'_>) -> Result<C>
where
    K: Payload,
    V: Payload,
    C: FromIterator<(K, V)>,
{
    let count = r.get_count()?;
    (0..count)
        .map(|_| -> Result<(K, V)> { Ok((read(r)?, read(r)?)) })
        .collect()
}

impl<T: Payload> Payload for Vec<T> {
    const SHAPE: Shape = Shape::Reference;

    fn encode(&self, w: &mut PayloadWriter) {
        write_seq(self, self.len(), w);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        read_seq(r)
    }
}

impl<T: Payload> Payload for VecDeque<T> {
    const SHAPE: Shape = Shape::Reference;

    fn encode(&self, w: &mut PayloadWriter) {
        write_seq(self, self.len(), w);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        read_seq(r)
    }
}

impl<T: Payload + Eq + Hash> Payload for HashSet<T> {
    const SHAPE: Shape = Shape::Reference;

    fn encode(&self, w: &mut PayloadWriter) {
        write_seq(self, self.len(), w);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        read_seq(r)
    }
}

impl<T: Payload + Ord> Payload for BTreeSet<T> {
    const SHAPE: Shape = Shape::Reference;

    fn encode(&self, w: &mut PayloadWriter) {
        write_seq(self, self.len(), w);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        read_seq(r)
    }
}

impl<T: Payload, const N: usize> Payload for [T; N] {
    const SHAPE: Shape = Shape::Reference;

    fn encode(&self, w: &mut PayloadWriter) {
        write_seq(self, N, w);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let items: Vec<T> = read_seq(r)?;
        let got = items.len();
        items
            .try_into()
            .map_err(|_| DualcastError::decode(format!("array: expected {N} elements, got {got}")))
    }
}

/// Byte blobs share the `Vec<u8>` encoding.
impl Payload for Bytes {
    const SHAPE: Shape = Shape::Reference;

    fn encode(&self, w: &mut PayloadWriter) {
        w.put_count(self.len());
        w.put_slice(self);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let n = r.get_count()?;
        Ok(Bytes::copy_from_slice(r.get_slice(n)?))
    }
}

impl<K: Payload + Eq + Hash, V: Payload> Payload for HashMap<K, V> {
    const SHAPE: Shape = Shape::Reference;

    fn encode(&self, w: &mut PayloadWriter) {
        write_map(self, self.len(), w);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        read_map(r)
    }
}

impl<K: Payload + Ord, V: Payload> Payload for BTreeMap<K, V> {
    const SHAPE: Shape = Shape::Reference;

    fn encode(&self, w: &mut PayloadWriter) {
        write_map(self, self.len(), w);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        read_map(r)
    }
}

macro_rules! tuple_payload {
    ($(($($name:ident),+))*) => {
        $(
            impl<$($name: Payload),+> Payload for ($($name,)+) {
                #[allow(non_snake_case)]
                fn encode(&self, w: &mut PayloadWriter) {
                    let ($($name,)+) = self;
                    $( write($name, w); )+
                }

                fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
                    Ok(($(read::<$name>(r)?,)+))
                }
            }
        )*
    };
}

tuple_payload! {
    (A)
    (A, B)
    (A, B, C)
    (A, B, C, D)
    (A, B, C, D, E)
    (A, B, C, D, E, F)
    (A, B, C, D, E, F, G)
}

// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// A raw byte block. Clones share one allocation; the first mutable access through a shared
/// handle detaches it with a private copy, so writes are never visible through other clones.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Vec<u8>>);

impl Buffer {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Buffer(Arc::new(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Buffer(Arc::new(bytes.to_vec()))
    }

    /// `size` zero bytes.
    pub fn zeroed(size: usize) -> Self {
        Buffer(Arc::new(vec![0; size]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn as_bytes_mut(&mut self) -> &mut Vec<u8> {
        Arc::make_mut(&mut self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both handles point at the same allocation.
    pub fn shares_storage(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl Debug for Buffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Buffer({} bytes)", self.len())
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Buffer {}

impl PartialOrd for Buffer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Buffer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for Buffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state)
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Buffer::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_until_written() {
        let a = Buffer::from_slice(b"hello");
        let mut b = a.clone();
        assert!(a.shares_storage(&b));
        assert_eq!(a.share_count(), 2);

        b.as_bytes_mut()[0] = b'j';
        assert!(!a.shares_storage(&b));
        assert_eq!(a.as_bytes(), b"hello");
        assert_eq!(b.as_bytes(), b"jello");
        assert_eq!(a.share_count(), 1);
    }

    #[test]
    fn test_unshared_write_does_not_copy() {
        let mut a = Buffer::zeroed(4);
        let before = a.as_bytes().as_ptr();
        a.as_bytes_mut()[3] = 7;
        assert_eq!(a.as_bytes().as_ptr(), before);
        assert_eq!(a.as_bytes(), &[0, 0, 0, 7]);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(Buffer::from_slice(b"ab") < Buffer::from_slice(b"b"));
        assert!(Buffer::from_slice(b"ab") > Buffer::from_slice(b"a"));
    }
}

//! In-process fake of the element-store module.
//!
//! Implements the same operation set and fail-open semantics as the
//! compiled module, including a simulated linear-memory arena behind the
//! raw surface, so every calling convention can be exercised without a
//! module file. Used by the test suite and by `bench --fake` dry runs.

use std::collections::HashMap;

use crate::config::{ATTRS_PER_ELEMENT, ELEMENT_COUNT, RESTRUCT_CHILDREN, RESTRUCT_PARENTS};
use crate::error::StoreError;
use crate::store::{truncate_to_char_boundary, ElementStore, GuestPtr, RawElementStore,
    StoreResult};

/// Keep address zero unallocated so it stays a valid null.
const NULL_GUARD: usize = 8;

/// Arena region reserved for strings returned by the "module".
const RESULT_REGION_LEN: usize = 1024;

#[derive(Debug, Default)]
struct Element {
    parent: Option<String>,
    children: Vec<String>,
    attrs: HashMap<String, String>,
}

/// In-memory element/attribute tree with a simulated guest arena.
#[derive(Debug, Default)]
pub struct FakeStore {
    elements: HashMap<String, Element>,
    arena: Arena,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live host-side allocations in the simulated arena.
    pub fn outstanding_allocations(&self) -> usize {
        self.arena.live.len()
    }

    fn do_add_element(&mut self, id: String) {
        self.elements.entry(id).or_default();
    }

    fn do_set_attr(&mut self, id: &str, key: &str, value: &str) {
        if let Some(elem) = self.elements.get_mut(id) {
            elem.attrs.insert(key.to_string(), value.to_string());
        }
    }

    fn do_attr(&self, id: &str, key: &str) -> String {
        self.elements
            .get(id)
            .and_then(|elem| elem.attrs.get(key))
            .cloned()
            .unwrap_or_default()
    }

    fn do_append_child(&mut self, parent_id: &str, child_id: &str) {
        if !self.elements.contains_key(parent_id) || !self.elements.contains_key(child_id) {
            return;
        }

        // Detach from the previous parent before appending.
        let previous = self
            .elements
            .get(child_id)
            .and_then(|child| child.parent.clone());
        if let Some(previous_id) = previous {
            if let Some(previous_parent) = self.elements.get_mut(&previous_id) {
                previous_parent.children.retain(|id| id != child_id);
            }
        }

        if let Some(parent) = self.elements.get_mut(parent_id) {
            parent.children.push(child_id.to_string());
        }
        if let Some(child) = self.elements.get_mut(child_id) {
            child.parent = Some(parent_id.to_string());
        }
    }

    fn do_first_child(&self, id: &str) -> String {
        self.elements
            .get(id)
            .and_then(|elem| elem.children.first())
            .cloned()
            .unwrap_or_default()
    }
}

impl ElementStore for FakeStore {
    fn clear(&mut self) -> StoreResult<()> {
        self.elements.clear();
        Ok(())
    }

    fn element_count(&mut self) -> StoreResult<u32> {
        Ok(self.elements.len() as u32)
    }

    fn add_element(&mut self, id: &str) -> StoreResult<()> {
        self.do_add_element(id.to_string());
        Ok(())
    }

    fn append_child(&mut self, parent_id: &str, child_id: &str) -> StoreResult<()> {
        self.do_append_child(parent_id, child_id);
        Ok(())
    }

    fn first_child(&mut self, id: &str) -> StoreResult<String> {
        Ok(self.do_first_child(id))
    }

    fn set_attr(&mut self, id: &str, key: &str, value: &str) -> StoreResult<()> {
        self.do_set_attr(id, key, value);
        Ok(())
    }

    fn attr(&mut self, id: &str, key: &str) -> StoreResult<String> {
        Ok(self.do_attr(id, key))
    }

    fn create_elements(&mut self) -> StoreResult<()> {
        for i in 0..ELEMENT_COUNT {
            let id = format!("node-{i}");
            self.do_add_element(id.clone());
            for j in 0..ATTRS_PER_ELEMENT {
                self.do_set_attr(&id, &format!("attr-{j}"), &format!("value-{j}"));
            }
        }
        Ok(())
    }

    fn restruct_tree(&mut self) -> StoreResult<()> {
        for i in 0..RESTRUCT_PARENTS {
            let parent_id = format!("node-{i}");
            for j in 0..RESTRUCT_CHILDREN {
                self.do_append_child(&parent_id, &format!("node-{}", i + j + 1));
            }
            for j in 0..RESTRUCT_CHILDREN {
                let _ = self.do_first_child(&format!("node-{}", j + 1));
            }
        }
        Ok(())
    }

    fn raw(&mut self) -> &mut dyn RawElementStore {
        self
    }
}

impl RawElementStore for FakeStore {
    fn alloc(&mut self, len: usize) -> StoreResult<GuestPtr> {
        Ok(self.arena.alloc(len))
    }

    fn free(&mut self, ptr: GuestPtr) -> StoreResult<()> {
        self.arena.free(ptr)
    }

    fn write_cstr(&mut self, ptr: GuestPtr, capacity: usize, value: &str) -> StoreResult<()> {
        self.arena.write_cstr(ptr, capacity, value)
    }

    fn read_cstr(&mut self, ptr: GuestPtr) -> StoreResult<String> {
        self.arena.read_cstr(ptr)
    }

    fn add_element_raw(&mut self, id: GuestPtr) -> StoreResult<()> {
        let id = self.arena.read_cstr(id)?;
        self.do_add_element(id);
        Ok(())
    }

    fn append_child_raw(&mut self, parent: GuestPtr, child: GuestPtr) -> StoreResult<()> {
        let parent_id = self.arena.read_cstr(parent)?;
        let child_id = self.arena.read_cstr(child)?;
        self.do_append_child(&parent_id, &child_id);
        Ok(())
    }

    fn first_child_raw(&mut self, id: GuestPtr) -> StoreResult<GuestPtr> {
        let id = self.arena.read_cstr(id)?;
        let child = self.do_first_child(&id);
        Ok(self.arena.set_result(&child))
    }

    fn set_attr_raw(&mut self, id: GuestPtr, key: GuestPtr, value: GuestPtr) -> StoreResult<()> {
        let id = self.arena.read_cstr(id)?;
        let key = self.arena.read_cstr(key)?;
        let value = self.arena.read_cstr(value)?;
        self.do_set_attr(&id, &key, &value);
        Ok(())
    }

    fn element_count_raw(&mut self) -> StoreResult<u32> {
        Ok(self.elements.len() as u32)
    }
}

/// Simulated guest linear memory: bump allocation plus a live-pointer table.
#[derive(Debug)]
struct Arena {
    data: Vec<u8>,
    live: HashMap<u32, usize>,
    result_ptr: u32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            data: vec![0; NULL_GUARD + RESULT_REGION_LEN],
            live: HashMap::new(),
            result_ptr: NULL_GUARD as u32,
        }
    }
}

impl Arena {
    fn alloc(&mut self, len: usize) -> GuestPtr {
        let ptr = self.data.len() as u32;
        self.data.resize(self.data.len() + len.max(1), 0);
        self.live.insert(ptr, len);
        GuestPtr(ptr)
    }

    fn free(&mut self, ptr: GuestPtr) -> StoreResult<()> {
        self.live
            .remove(&ptr.0)
            .map(|_| ())
            .ok_or(StoreError::InvalidFree { addr: ptr.0 })
    }

    fn write_cstr(&mut self, ptr: GuestPtr, capacity: usize, value: &str) -> StoreResult<()> {
        let truncated = truncate_to_char_boundary(value, capacity.saturating_sub(1));
        let start = ptr.0 as usize;
        let end = start + truncated.len() + 1;
        if start == 0 || end > self.data.len() {
            return Err(StoreError::MemoryAccess { addr: ptr.0 });
        }
        self.data[start..end - 1].copy_from_slice(truncated.as_bytes());
        self.data[end - 1] = 0;
        Ok(())
    }

    fn read_cstr(&self, ptr: GuestPtr) -> StoreResult<String> {
        if ptr.is_null() {
            return Ok(String::new());
        }
        let start = ptr.0 as usize;
        if start >= self.data.len() {
            return Err(StoreError::MemoryAccess { addr: ptr.0 });
        }
        let tail = &self.data[start..];
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(StoreError::MemoryAccess { addr: ptr.0 })?;
        std::str::from_utf8(&tail[..len])
            .map(str::to_owned)
            .map_err(|_| StoreError::InvalidUtf8 { addr: ptr.0 })
    }

    /// Write a module-owned result string and return its address.
    fn set_result(&mut self, value: &str) -> GuestPtr {
        let ptr = GuestPtr(self.result_ptr);
        // The reserved region always exists, so this cannot fail.
        let _ = self.write_cstr(ptr, RESULT_REGION_LEN, value);
        ptr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let mut store = FakeStore::new();
        assert_eq!(store.element_count().unwrap(), 0);
    }

    #[test]
    fn add_element_is_idempotent() {
        let mut store = FakeStore::new();
        store.add_element("node-0").unwrap();
        store.add_element("node-0").unwrap();
        assert_eq!(store.element_count().unwrap(), 1);
    }

    #[test]
    fn attr_roundtrip_and_overwrite() {
        let mut store = FakeStore::new();
        store.add_element("node-0").unwrap();
        store.set_attr("node-0", "attr-0", "value-0").unwrap();
        assert_eq!(store.attr("node-0", "attr-0").unwrap(), "value-0");
        store.set_attr("node-0", "attr-0", "value-1").unwrap();
        assert_eq!(store.attr("node-0", "attr-0").unwrap(), "value-1");
    }

    #[test]
    fn unknown_lookups_fail_open() {
        let mut store = FakeStore::new();
        store.add_element("node-0").unwrap();
        // unknown element, unknown key, unknown child: empty, never an error
        assert_eq!(store.attr("node-A", "attr-1").unwrap(), "");
        assert_eq!(store.attr("node-0", "attr-1000").unwrap(), "");
        assert_eq!(store.first_child("node-0").unwrap(), "");
        assert_eq!(store.first_child("node-A").unwrap(), "");
    }

    #[test]
    fn set_attr_on_unknown_element_is_ignored() {
        let mut store = FakeStore::new();
        store.set_attr("node-0", "attr-0", "value-0").unwrap();
        assert_eq!(store.element_count().unwrap(), 0);
    }

    #[test]
    fn append_child_reparents() {
        let mut store = FakeStore::new();
        for id in ["a", "b", "c"] {
            store.add_element(id).unwrap();
        }
        store.append_child("a", "c").unwrap();
        assert_eq!(store.first_child("a").unwrap(), "c");

        store.append_child("b", "c").unwrap();
        assert_eq!(store.first_child("b").unwrap(), "c");
        assert_eq!(store.first_child("a").unwrap(), "");
    }

    #[test]
    fn append_child_with_unknown_ids_is_ignored() {
        let mut store = FakeStore::new();
        store.add_element("a").unwrap();
        store.append_child("a", "missing").unwrap();
        store.append_child("missing", "a").unwrap();
        assert_eq!(store.first_child("a").unwrap(), "");
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = FakeStore::new();
        store.create_elements().unwrap();
        store.clear().unwrap();
        assert_eq!(store.element_count().unwrap(), 0);
    }

    #[test]
    fn create_elements_builds_the_full_grid() {
        let mut store = FakeStore::new();
        store.create_elements().unwrap();
        assert_eq!(store.element_count().unwrap(), ELEMENT_COUNT as u32);
        assert_eq!(store.attr("node-100", "attr-20").unwrap(), "value-20");
        assert_eq!(store.attr("node-999", "attr-7").unwrap(), "value-7");
        assert_eq!(store.attr("node-9999", "attr-29").unwrap(), "value-29");
        assert_eq!(store.attr("node-999", "attr-1000").unwrap(), "");
    }

    #[test]
    fn create_elements_is_stable_over_a_populated_store() {
        let mut store = FakeStore::new();
        store.create_elements().unwrap();
        store.create_elements().unwrap();
        assert_eq!(store.element_count().unwrap(), ELEMENT_COUNT as u32);
    }

    #[test]
    fn restruct_tree_links_the_first_parent() {
        let mut store = FakeStore::new();
        store.create_elements().unwrap();
        store.restruct_tree().unwrap();
        assert_eq!(store.first_child("node-0").unwrap(), "node-1");
    }

    #[test]
    fn arena_rejects_double_free() {
        let mut store = FakeStore::new();
        let ptr = store.alloc(16).unwrap();
        store.free(ptr).unwrap();
        let err = store.free(ptr).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFree { .. }));
    }

    #[test]
    fn arena_cstr_roundtrip() {
        let mut store = FakeStore::new();
        let ptr = store.alloc(16).unwrap();
        store.write_cstr(ptr, 16, "hello").unwrap();
        assert_eq!(store.read_cstr(ptr).unwrap(), "hello");
    }

    #[test]
    fn arena_null_reads_empty() {
        let mut store = FakeStore::new();
        assert_eq!(store.read_cstr(GuestPtr::NULL).unwrap(), "");
    }

    #[test]
    fn raw_surface_matches_marshalled_surface() {
        let mut store = FakeStore::new();
        let id = store.alloc(16).unwrap();
        store.write_cstr(id, 16, "node-0").unwrap();
        store.add_element_raw(id).unwrap();
        assert_eq!(store.element_count_raw().unwrap(), 1);

        let key = store.alloc(16).unwrap();
        let value = store.alloc(16).unwrap();
        store.write_cstr(key, 16, "attr-0").unwrap();
        store.write_cstr(value, 16, "value-0").unwrap();
        store.set_attr_raw(id, key, value).unwrap();
        assert_eq!(store.attr("node-0", "attr-0").unwrap(), "value-0");

        let missing = store.first_child_raw(id).unwrap();
        assert_eq!(store.read_cstr(missing).unwrap(), "");
    }
}

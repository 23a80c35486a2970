// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process stand-in for the managed runtime, for tests and JVM-less builds.
//
// Models just enough of the JVM's native-bridge contract for the boundary:
// a string/class heap, per-thread attachment, per-context local references
// and pending-exception slot, copy-or-alias string buffers, and an optional
// heap limit to provoke allocation failures. It also keeps a ledger of
// outstanding buffers and bogus releases so leaks are observable.
//
// Strings no local reference can reach are collected when a frame ends,
// unless a GetStringUTFChars buffer still pins them.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::{CStr, CString, c_char};
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use randwerk_core::error::{BridgeError, Result};
use randwerk_core::mutf8;

use crate::traits::NativeBridge;

const NO_CLASS_DEF: &str = "java/lang/NoClassDefFoundError";
const OUT_OF_MEMORY: &str = "java/lang/OutOfMemoryError";

/// Local reference handed out by a [`SimEnv`]. Zero is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimRef(u64);

/// Whether GetStringUTFChars hands out copies or pointers into the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyPolicy {
    #[default]
    Copy,
    Alias,
}

/// An exception as the managed caller would observe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Throwable {
    /// Binary class name, e.g. `java/lang/RuntimeException`.
    pub class: String,
    pub message: String,
}

impl fmt::Display for Throwable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class.replace('/', "."), self.message)
    }
}

enum Object {
    /// Modified UTF-8 bytes including the trailing NUL.
    Str(Box<[u8]>),
    Class(String),
}

struct CopiedBuffer {
    len: usize,
    _bytes: Box<[u8]>,
}

struct Heap {
    objects: HashMap<u64, Object>,
    class_objects: HashMap<String, u64>,
    next_id: u64,
    classes: HashSet<String>,
    silent_lookup_miss: bool,
    copy_policy: CopyPolicy,
    heap_limit: Option<usize>,
    heap_used: usize,
    /// Local references to each object, across every attached context.
    refs: HashMap<u64, usize>,
    /// Bytes charged to `heap_used` for strings native code created.
    charged: HashMap<u64, usize>,
    copies: HashMap<usize, CopiedBuffer>,
    pins: HashMap<usize, usize>,
    bogus_releases: usize,
    attached: HashSet<ThreadId>,
}

impl Heap {
    fn alloc(&mut self, object: Object) -> u64 {
        self.next_id += 1;
        self.objects.insert(self.next_id, object);
        self.next_id
    }

    fn fits(&self, bytes: usize) -> bool {
        self.heap_limit
            .is_none_or(|limit| self.heap_used + bytes <= limit)
    }

    fn retain(&mut self, id: u64) {
        *self.refs.entry(id).or_default() += 1;
    }

    fn forget(&mut self, id: u64) {
        if let Some(count) = self.refs.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.refs.remove(&id);
            }
        }
    }

    /// Free unreachable, unpinned strings and return their bytes.
    fn collect(&mut self) {
        let garbage: Vec<u64> = self
            .objects
            .iter()
            .filter(|&(id, object)| match object {
                Object::Str(bytes) => {
                    !self.refs.contains_key(id)
                        && !self.pins.contains_key(&(bytes.as_ptr() as usize))
                }
                Object::Class(_) => false,
            })
            .map(|(&id, _)| id)
            .collect();
        for id in garbage {
            self.objects.remove(&id);
            if let Some(bytes) = self.charged.remove(&id) {
                self.heap_used -= bytes;
            }
        }
    }

    fn class_object(&mut self, name: &str) -> u64 {
        if let Some(&id) = self.class_objects.get(name) {
            return id;
        }
        let id = self.alloc(Object::Class(name.to_owned()));
        self.class_objects.insert(name.to_owned(), id);
        id
    }
}

/// Builder for a [`SimVm`].
pub struct SimVmBuilder {
    classes: HashSet<String>,
    silent_lookup_miss: bool,
    copy_policy: CopyPolicy,
    heap_limit: Option<usize>,
}

impl Default for SimVmBuilder {
    fn default() -> Self {
        let classes = [
            "java/lang/String",
            "java/lang/Throwable",
            "java/lang/Error",
            "java/lang/RuntimeException",
            "java/lang/IllegalStateException",
            NO_CLASS_DEF,
            OUT_OF_MEMORY,
        ]
        .into_iter()
        .map(String::from)
        .collect();
        Self {
            classes,
            silent_lookup_miss: false,
            copy_policy: CopyPolicy::default(),
            heap_limit: None,
        }
    }
}

impl SimVmBuilder {
    pub fn copy_policy(mut self, policy: CopyPolicy) -> Self {
        self.copy_policy = policy;
        self
    }

    /// Cap the bytes native code may allocate (new strings and copies).
    pub fn heap_limit(mut self, bytes: usize) -> Self {
        self.heap_limit = Some(bytes);
        self
    }

    pub fn without_class(mut self, name: &str) -> Self {
        self.classes.remove(name);
        self
    }

    /// Make FindClass misses return null without arming NoClassDefFoundError.
    pub fn silent_lookup_miss(mut self, silent: bool) -> Self {
        self.silent_lookup_miss = silent;
        self
    }

    pub fn build(self) -> SimVm {
        SimVm {
            heap: Arc::new(Mutex::new(Heap {
                objects: HashMap::new(),
                class_objects: HashMap::new(),
                next_id: 0,
                classes: self.classes,
                silent_lookup_miss: self.silent_lookup_miss,
                copy_policy: self.copy_policy,
                heap_limit: self.heap_limit,
                heap_used: 0,
                refs: HashMap::new(),
                charged: HashMap::new(),
                copies: HashMap::new(),
                pins: HashMap::new(),
                bogus_releases: 0,
                attached: HashSet::new(),
            })),
        }
    }
}

/// The simulated runtime. Cheap to clone; clones share one heap.
#[derive(Clone)]
pub struct SimVm {
    heap: Arc<Mutex<Heap>>,
}

impl Default for SimVm {
    fn default() -> Self {
        SimVmBuilder::default().build()
    }
}

impl SimVm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SimVmBuilder {
        SimVmBuilder::default()
    }

    fn heap(&self) -> MutexGuard<'_, Heap> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach the calling thread, returning its execution context.
    ///
    /// A thread holds at most one attachment; dropping the context detaches.
    pub fn attach_current_thread(&self) -> Result<SimEnv> {
        let thread = thread::current().id();
        if !self.heap().attached.insert(thread) {
            return Err(BridgeError::AlreadyAttached);
        }
        tracing::debug!(?thread, "sim: thread attached");
        Ok(SimEnv {
            vm: self.clone(),
            thread,
            locals: RefCell::new(HashMap::new()),
            next_local: RefCell::new(0),
            pending: RefCell::new(None),
            _not_send: PhantomData,
        })
    }

    /// Buffers obtained through GetStringUTFChars and not yet released.
    pub fn outstanding_buffers(&self) -> usize {
        let heap = self.heap();
        heap.copies.len() + heap.pins.values().sum::<usize>()
    }

    /// Releases of pointers the runtime never handed out.
    pub fn bogus_releases(&self) -> usize {
        self.heap().bogus_releases
    }

    /// Bytes currently allocated on behalf of native code.
    pub fn heap_used(&self) -> usize {
        self.heap().heap_used
    }

    pub fn attached_threads(&self) -> usize {
        self.heap().attached.len()
    }

    /// Objects currently on the heap, class objects included.
    pub fn live_objects(&self) -> usize {
        self.heap().objects.len()
    }
}

/// One thread's attachment: local reference table plus pending-exception slot.
pub struct SimEnv {
    vm: SimVm,
    thread: ThreadId,
    locals: RefCell<HashMap<u64, u64>>,
    next_local: RefCell<u64>,
    pending: RefCell<Option<Throwable>>,
    _not_send: PhantomData<*const ()>,
}

impl SimEnv {
    fn new_local(&self, object: u64) -> SimRef {
        let mut next = self.next_local.borrow_mut();
        *next += 1;
        self.vm.heap().retain(object);
        self.locals.borrow_mut().insert(*next, object);
        SimRef(*next)
    }

    fn resolve(&self, obj: SimRef) -> Option<u64> {
        self.locals.borrow().get(&obj.0).copied()
    }

    fn arm(&self, class: &str, message: impl Into<String>) {
        let throwable = Throwable {
            class: class.to_owned(),
            message: message.into(),
        };
        tracing::debug!(%throwable, "sim: exception armed");
        *self.pending.borrow_mut() = Some(throwable);
    }

    /// Create a string the way the managed side would pass one in.
    pub fn managed_string(&self, text: &str) -> SimRef {
        let bytes = mutf8::encode_c(text).into_bytes_with_nul().into_boxed_slice();
        let id = self.vm.heap().alloc(Object::Str(bytes));
        self.new_local(id)
    }

    /// Modified UTF-8 bytes of a string object, terminator excluded.
    pub fn string_bytes(&self, obj: SimRef) -> Option<Vec<u8>> {
        let id = self.resolve(obj)?;
        match self.vm.heap().objects.get(&id)? {
            Object::Str(bytes) => Some(bytes[..bytes.len() - 1].to_vec()),
            Object::Class(_) => None,
        }
    }

    /// Decoded content of a string object.
    pub fn string_content(&self, obj: SimRef) -> Option<String> {
        self.string_bytes(obj).map(|b| mutf8::decode_lossy(&b))
    }

    /// Look at the pending exception without delivering it.
    pub fn pending_exception(&self) -> Option<Throwable> {
        self.pending.borrow().clone()
    }

    /// End the native frame: deliver the pending exception (if any) to the
    /// managed caller, drop every local reference and collect what became
    /// unreachable.
    pub fn return_to_managed(&self) -> Option<Throwable> {
        let mut heap = self.vm.heap();
        for (_, id) in self.locals.borrow_mut().drain() {
            heap.forget(id);
        }
        heap.collect();
        drop(heap);
        self.pending.borrow_mut().take()
    }

    pub fn live_local_refs(&self) -> usize {
        self.locals.borrow().len()
    }
}

impl Drop for SimEnv {
    fn drop(&mut self) {
        let mut heap = self.vm.heap();
        heap.attached.remove(&self.thread);
        for (_, id) in self.locals.get_mut().drain() {
            heap.forget(id);
        }
        heap.collect();
        if let Some(pending) = self.pending.get_mut().take() {
            tracing::warn!(%pending, "sim: detaching with an undelivered exception");
        }
    }
}

// SAFETY: copies live in `Heap::copies` until released. Aliased buffers
// belong to heap objects, and `Heap::collect` skips any string with a pin
// outstanding. Neither moves because both are boxed.
unsafe impl NativeBridge for SimEnv {
    type Ref = SimRef;

    const NULL: SimRef = SimRef(0);

    fn get_string_utf_chars(&self, string: SimRef, is_copy: Option<&mut bool>) -> *const c_char {
        let Some(id) = self.resolve(string) else {
            tracing::warn!(?string, "sim: GetStringUTFChars on a dead reference");
            return ptr::null();
        };
        let mut heap = self.vm.heap();
        let (aliased, copy) = match heap.objects.get(&id) {
            Some(Object::Str(bytes)) => {
                let copy = (heap.copy_policy == CopyPolicy::Copy).then(|| bytes.clone());
                (bytes.as_ptr().cast::<c_char>(), copy)
            }
            _ => return ptr::null(),
        };
        let (chars, copied) = match copy {
            None => {
                *heap.pins.entry(aliased as usize).or_default() += 1;
                (aliased, false)
            }
            Some(copy) => {
                let len = copy.len();
                if !heap.fits(len) {
                    drop(heap);
                    self.arm(OUT_OF_MEMORY, "unable to copy string chars");
                    return ptr::null();
                }
                let chars = copy.as_ptr().cast::<c_char>();
                heap.heap_used += len;
                heap.copies
                    .insert(chars as usize, CopiedBuffer { len, _bytes: copy });
                (chars, true)
            }
        };
        if let Some(out) = is_copy {
            *out = copied;
        }
        chars
    }

    unsafe fn release_string_utf_chars(&self, _string: SimRef, chars: *const c_char) {
        let mut heap = self.vm.heap();
        let addr = chars as usize;
        if let Some(buffer) = heap.copies.remove(&addr) {
            heap.heap_used -= buffer.len;
            return;
        }
        if let Some(count) = heap.pins.get_mut(&addr) {
            *count -= 1;
            if *count == 0 {
                heap.pins.remove(&addr);
            }
            return;
        }
        heap.bogus_releases += 1;
        tracing::warn!(addr, "sim: release of a buffer the runtime never handed out");
    }

    fn new_string_utf(&self, bytes: &CStr) -> SimRef {
        let bytes = bytes.to_bytes_with_nul();
        let mut heap = self.vm.heap();
        if !heap.fits(bytes.len()) {
            drop(heap);
            self.arm(OUT_OF_MEMORY, "unable to allocate string");
            return Self::NULL;
        }
        heap.heap_used += bytes.len();
        let id = heap.alloc(Object::Str(bytes.into()));
        heap.charged.insert(id, bytes.len());
        drop(heap);
        self.new_local(id)
    }

    fn find_class(&self, name: &CStr) -> SimRef {
        let name = name.to_string_lossy();
        let mut heap = self.vm.heap();
        if heap.classes.contains(name.as_ref()) {
            let id = heap.class_object(&name);
            drop(heap);
            return self.new_local(id);
        }
        let silent = heap.silent_lookup_miss;
        drop(heap);
        if !silent {
            self.arm(NO_CLASS_DEF, name.into_owned());
        }
        Self::NULL
    }

    fn throw_new(&self, class: SimRef, message: &CStr) -> i32 {
        let Some(id) = self.resolve(class) else {
            return -1;
        };
        let class = match self.vm.heap().objects.get(&id) {
            Some(Object::Class(name)) => name.clone(),
            _ => return -1,
        };
        self.arm(&class, mutf8::decode_lossy(message.to_bytes()));
        0
    }

    fn delete_local_ref(&self, obj: SimRef) {
        if obj == Self::NULL {
            return;
        }
        match self.locals.borrow_mut().remove(&obj.0) {
            Some(id) => self.vm.heap().forget(id),
            None => tracing::warn!(?obj, "sim: DeleteLocalRef on an unknown reference"),
        }
    }

    fn exception_check(&self) -> bool {
        self.pending.borrow().is_some()
    }

    fn exception_clear(&self) {
        self.pending.borrow_mut().take();
    }
}

/// Build a `CString` for tests and callers that start from Rust text.
pub fn c_text(text: &str) -> CString {
    mutf8::encode_c(text)
}

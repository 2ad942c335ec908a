//! Raw field access and entry-point construction
//!
//! These are the deliberate escape hatches at the end of the pipeline.
//! Nothing here can verify that an address points at a live, correctly
//! laid-out object, or that resolved code matches an assumed calling
//! convention; misuse is undefined behavior by contract, not a
//! recoverable error. Both capabilities must be constructed explicitly
//! through `unsafe` constructors so their use sites stand out, and no
//! other component ever hands one out.

use crate::core::types::Address;
use std::marker::PhantomData;
use std::mem;

/// Capability to read and write a typed field at `base + offset`.
///
/// Carries no validity guarantee beyond what the caller asserted when
/// constructing it. Debug builds check null, address-space overflow
/// and alignment at access time; release builds check nothing.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<T> {
    base: Address,
    offset: isize,
    _type: PhantomData<*mut T>,
}

impl<T: Copy> FieldRef<T> {
    /// Creates a field reference.
    ///
    /// # Safety
    ///
    /// The caller asserts that `base + offset` will point at a live,
    /// properly aligned `T` in the current address space whenever
    /// [`read`] or [`write`] is called, and that the object outlives
    /// every access. Violating this is undefined behavior.
    ///
    /// [`read`]: FieldRef::read
    /// [`write`]: FieldRef::write
    pub unsafe fn new(base: Address, offset: isize) -> Self {
        FieldRef {
            base,
            offset,
            _type: PhantomData,
        }
    }

    /// The resolved address this capability points at
    pub fn address(&self) -> Address {
        self.base.offset(self.offset)
    }

    /// Reads the field.
    ///
    /// # Safety
    ///
    /// The contract given at construction must hold at the moment of
    /// the call: the target must be readable, aligned and contain a
    /// valid `T`.
    pub unsafe fn read(&self) -> T {
        let addr = self.checked_target();
        std::ptr::read(addr.as_ptr::<T>())
    }

    /// Writes the field.
    ///
    /// # Safety
    ///
    /// Same as [`read`], and additionally the target must be writable
    /// and no other code may be concurrently reading or writing it.
    ///
    /// [`read`]: FieldRef::read
    pub unsafe fn write(&self, value: T) {
        let addr = self.checked_target();
        std::ptr::write(addr.as_mut_ptr::<T>(), value);
    }

    fn checked_target(&self) -> Address {
        let addr = self.address();
        debug_assert!(!addr.is_null(), "field access through null address");
        debug_assert!(
            addr.is_aligned(mem::align_of::<T>()),
            "field at {addr} misaligned for {}",
            std::any::type_name::<T>()
        );
        addr
    }
}

/// Capability to call code at a resolved address.
///
/// The calling convention and signature live entirely in the function
/// pointer type `F` the caller transmutes to; nothing validates that
/// the bytes at the address implement it.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoint {
    address: Address,
}

impl EntryPoint {
    /// Creates an entry point at an address.
    ///
    /// # Safety
    ///
    /// The caller asserts the address points at executable code in the
    /// current address space that conforms to whatever function type
    /// it will later be cast to.
    pub unsafe fn new(address: Address) -> Self {
        debug_assert!(!address.is_null(), "entry point at null address");
        EntryPoint { address }
    }

    /// The code address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Reinterprets the address as a callable of type `F`, e.g.
    /// `extern "C" fn(i32) -> i32`.
    ///
    /// # Safety
    ///
    /// `F` must be a function pointer type whose ABI, argument types
    /// and return type exactly match the code at the address. Calling
    /// the result with a mismatched signature or convention is
    /// undefined behavior.
    pub unsafe fn as_fn<F: Copy>(&self) -> F {
        debug_assert_eq!(
            mem::size_of::<F>(),
            mem::size_of::<usize>(),
            "target type is not a plain function pointer"
        );
        mem::transmute_copy(&self.address.as_usize())
    }
}

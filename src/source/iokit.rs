//! accelerator discovery through the i/o kit registry.
//!
//! the probe finds the first `IOAccelerator` service and reads its property table. no property in
//! that table is mapped to a utilization metric, so a found accelerator still reads as
//! [`GpuReading::Unavailable`].

use {
    super::{GpuProbe, GpuReading},
    std::{
        ffi::{c_char, c_void},
        ptr,
    },
    tracing::debug,
};

type KernReturn = i32;
type MachPort = u32;
type IoObject = MachPort;

const KERN_SUCCESS: KernReturn = 0;
const MACH_PORT_NULL: MachPort = 0;
const ACCELERATOR: &[u8] = b"IOAccelerator\0";

#[link(name = "IOKit", kind = "framework")]
unsafe extern "C" {
    fn IOMasterPort(bootstrap: MachPort, master: *mut MachPort) -> KernReturn;
    fn IOServiceMatching(name: *const c_char) -> *mut c_void;
    fn IOServiceGetMatchingServices(
        master: MachPort,
        matching: *mut c_void,
        existing: *mut IoObject,
    ) -> KernReturn;
    fn IOIteratorNext(iterator: IoObject) -> IoObject;
    fn IOObjectRelease(object: IoObject) -> KernReturn;
    fn IORegistryEntryCreateCFProperties(
        entry: IoObject,
        properties: *mut *mut c_void,
        allocator: *const c_void,
        options: u32,
    ) -> KernReturn;
}

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    fn CFRelease(cf: *const c_void);
}

/// probes the i/o kit registry for an accelerator.
#[derive(Default)]
pub struct IoKitProbe;

/// an i/o kit object handle, released when dropped.
struct Object(IoObject);

/// a core foundation property dictionary, released when dropped.
struct Properties(*mut c_void);

// === impl IoKitProbe ===

impl GpuProbe for IoKitProbe {
    fn probe(&self) -> GpuReading {
        match Self::accelerator_properties() {
            Ok(_properties) => debug!("accelerator found, but it reports no utilization metric"),
            Err(step) => debug!(%step, "no accelerator available"),
        }

        GpuReading::Unavailable
    }
}

impl IoKitProbe {
    fn accelerator_properties() -> Result<Properties, &'static str> {
        let mut master: MachPort = MACH_PORT_NULL;
        // SAFETY: `master` is a live local.
        if unsafe { IOMasterPort(MACH_PORT_NULL, &mut master) } != KERN_SUCCESS {
            return Err("IOMasterPort");
        }

        // SAFETY: the name is nul-terminated.
        let matching = unsafe { IOServiceMatching(ACCELERATOR.as_ptr().cast()) };
        if matching.is_null() {
            return Err("IOServiceMatching");
        }

        let mut iterator: IoObject = 0;
        // SAFETY: this call consumes the reference to `matching`.
        if unsafe { IOServiceGetMatchingServices(master, matching, &mut iterator) } != KERN_SUCCESS
        {
            return Err("IOServiceGetMatchingServices");
        }
        let iterator = Object(iterator);

        // SAFETY: `iterator` is a valid handle until dropped.
        let entry = match unsafe { IOIteratorNext(iterator.0) } {
            0 => return Err("IOIteratorNext"),
            entry => Object(entry),
        };
        drop(iterator);

        let mut properties = ptr::null_mut();
        // SAFETY: a null allocator selects the default allocator.
        let code = unsafe { IORegistryEntryCreateCFProperties(entry.0, &mut properties, ptr::null(), 0) };
        if code != KERN_SUCCESS || properties.is_null() {
            return Err("IORegistryEntryCreateCFProperties");
        }

        Ok(Properties(properties))
    }
}

// === impl Object ===

impl Drop for Object {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by i/o kit and is released exactly once.
        unsafe {
            IOObjectRelease(self.0);
        }
    }
}

// === impl Properties ===

impl Drop for Properties {
    fn drop(&mut self) {
        // SAFETY: the dictionary was created for us and is released exactly once.
        unsafe { CFRelease(self.0) }
    }
}

/// Marker for `#[repr(C)]` types made only of plain numbers, which can be
/// handed to the GPU as raw bytes.
///
/// # Safety
/// Implementors must be `#[repr(C)]`, contain no padding and no pointers.
pub unsafe trait Plain: Sized {
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: guaranteed by the trait contract.
        unsafe {
            std::slice::from_raw_parts(
                (self as *const Self).cast::<u8>(),
                std::mem::size_of::<Self>(),
            )
        }
    }
}

pub trait PlainSlice {
    fn as_bytes(&self) -> &[u8];
}

impl<T: Plain> PlainSlice for [T] {
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: every element is Plain, and slices have no inter-element padding.
        unsafe { std::slice::from_raw_parts(self.as_ptr().cast::<u8>(), std::mem::size_of_val(self)) }
    }
}

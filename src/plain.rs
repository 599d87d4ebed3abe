/// Types that can be handed to the gpu as raw bytes.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` (or a primitive) with no padding and no
/// pointers, so that every byte of a value is initialised plain data.
pub unsafe trait Plain {
    fn as_bytes(&self) -> &[u8] {
        let len = std::mem::size_of_val(self);
        // SAFETY: the implementor guarantees `self` is `len` initialised bytes.
        unsafe { std::slice::from_raw_parts((self as *const Self).cast::<u8>(), len) }
    }
}

unsafe impl<T: Plain> Plain for [T] {}

unsafe impl<T: Plain, const N: usize> Plain for [T; N] {}

unsafe impl Plain for u16 {}

unsafe impl Plain for f32 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_cover_every_element() {
        let indices: Vec<u16> = vec![0, 2, 1];
        assert_eq!(indices.as_bytes().len(), 6);

        let floats = [1.0f32, 2.0];
        assert_eq!(floats.as_bytes(), [1.0f32.to_ne_bytes(), 2.0f32.to_ne_bytes()].concat());
    }
}

use super::BinaryWrite;
use crate::error::Result;
use core::fmt;

/// A streaming hash that consumes bytes incrementally.
///
/// The context is created and owned by the caller; [`DigestWriter`] only borrows it.
pub trait Digest {
    /// The finished digest.
    type Output;

    /// Resets the hash to its initial state, discarding anything fed so far.
    fn init(&mut self);

    /// Feeds `data` into the hash.
    fn update(&mut self, data: &[u8]);

    /// Finishes the hash, returns the digest and leaves the context ready for reuse.
    fn finalize(&mut self) -> Self::Output;
}

#[cfg(feature = "sha2")]
macro_rules! impl_sha2_digest {
    ($($hash:ty),*) => {
        $(
            impl Digest for $hash {
                type Output = sha2::digest::Output<$hash>;

                fn init(&mut self) {
                    sha2::Digest::reset(self);
                }

                fn update(&mut self, data: &[u8]) {
                    sha2::Digest::update(self, data);
                }

                fn finalize(&mut self) -> Self::Output {
                    sha2::Digest::finalize_reset(self)
                }
            }
        )*
    };
}

#[cfg(feature = "sha2")]
impl_sha2_digest!(sha2::Sha256, sha2::Sha512);

/// A writer that feeds every byte into a [`Digest`] instead of a buffer.
///
/// This hashes an encoded value without materializing it. `render` (or
/// [`finalize`](Self::finalize)) returns the digest.
pub struct DigestWriter<'d, D: Digest> {
    ctx: &'d mut D,
    offset: usize,
}

impl<'d, D: Digest> DigestWriter<'d, D> {
    /// Wraps `ctx`.
    pub fn new(ctx: &'d mut D) -> Self {
        Self { ctx, offset: 0 }
    }

    /// Restarts the hash and the byte count.
    pub fn init(&mut self) -> &mut Self {
        self.ctx.init();
        self.offset = 0;
        self
    }

    /// Finishes the hash and returns the digest.
    pub fn finalize(&mut self) -> D::Output {
        self.offset = 0;
        self.ctx.finalize()
    }
}

impl<D: Digest> fmt::Debug for DigestWriter<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestWriter")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl<D: Digest> BinaryWrite for DigestWriter<'_, D> {
    type Output = D::Output;

    fn offset(&self) -> usize {
        self.offset
    }

    fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.ctx.update(bytes);
        self.offset += bytes.len();
        Ok(())
    }

    fn render(&mut self) -> Result<D::Output> {
        Ok(self.finalize())
    }

    fn destroy(&mut self) {
        self.offset = 0;
    }
}

//! ## takt-core::irq
//! **Interrupt masking capability**
//!
//! Timer lists and event queues may be touched from interrupt context. Every
//! mutation runs inside a [`CriticalSection`], which masks interrupts through the
//! injected [`InterruptControl`] and restores the saved level when dropped, so
//! early returns and `?` paths unmask too.

use std::fmt;

/// Saved interrupt level returned by [`InterruptControl::disable`].
pub type IrqLevel = u32;

/// Platform hook for masking interrupts.
pub trait InterruptControl {
    /// Masks interrupts and returns the previous level.
    fn disable(&self) -> IrqLevel;

    /// Restores a level previously returned by `disable`.
    fn restore(&self, level: IrqLevel);
}

/// Hosted targets have no interrupt context to guard against.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterrupts;

impl InterruptControl for NoInterrupts {
    #[inline]
    fn disable(&self) -> IrqLevel {
        0
    }

    #[inline]
    fn restore(&self, _level: IrqLevel) {}
}

/// A disable/enable function pair, as exported by most board support packages.
#[derive(Clone, Copy)]
pub struct IrqFns {
    pub disable: fn() -> IrqLevel,
    pub enable: fn(IrqLevel),
}

impl InterruptControl for IrqFns {
    #[inline]
    fn disable(&self) -> IrqLevel {
        (self.disable)()
    }

    #[inline]
    fn restore(&self, level: IrqLevel) {
        (self.enable)(level)
    }
}

impl fmt::Debug for IrqFns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqFns").finish_non_exhaustive()
    }
}

/// Scoped "interrupts masked" region.
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub struct CriticalSection<'a> {
    irq: &'a dyn InterruptControl,
    level: IrqLevel,
}

impl<'a> CriticalSection<'a> {
    #[inline]
    pub fn enter(irq: &'a dyn InterruptControl) -> Self {
        let level = irq.disable();
        Self { irq, level }
    }
}

impl Drop for CriticalSection<'_> {
    #[inline]
    fn drop(&mut self) {
        self.irq.restore(self.level);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CountingIrq;
    use super::*;

    #[test]
    fn test_critical_section_restores_on_drop() {
        let irq = CountingIrq::default();
        {
            let _outer = CriticalSection::enter(&irq);
            assert_eq!(irq.depth.get(), 1);
            {
                let _inner = CriticalSection::enter(&irq);
                assert_eq!(irq.depth.get(), 2);
            }
            assert_eq!(irq.depth.get(), 1);
        }
        assert_eq!(irq.depth.get(), 0);
        assert_eq!(irq.entered.get(), 2);
    }

    #[test]
    fn test_critical_section_restores_on_early_return() {
        fn fallible(irq: &CountingIrq, fail: bool) -> Result<u32, ()> {
            let _cs = CriticalSection::enter(irq);
            if fail {
                return Err(());
            }
            Ok(irq.depth.get())
        }

        let irq = CountingIrq::default();
        assert!(fallible(&irq, true).is_err());
        assert_eq!(irq.depth.get(), 0);
        assert_eq!(fallible(&irq, false), Ok(1));
        assert_eq!(irq.depth.get(), 0);
    }

    #[test]
    fn test_irq_fns_forward_calls() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static LEVEL: AtomicU32 = AtomicU32::new(3);

        let fns = IrqFns {
            disable: || LEVEL.swap(0, Ordering::SeqCst),
            enable: |level| LEVEL.store(level, Ordering::SeqCst),
        };

        {
            let _cs = CriticalSection::enter(&fns);
            assert_eq!(LEVEL.load(Ordering::SeqCst), 0);
        }
        assert_eq!(LEVEL.load(Ordering::SeqCst), 3);
    }
}

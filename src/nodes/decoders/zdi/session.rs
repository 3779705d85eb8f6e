//! Debug-session state shared by consecutive transactions
//!
//! Tracks the 24-bit write accumulator fed by the `ZDI_WR` registers, the
//! CPU register last selected through `ZDI_RW_CTL`, and a shadow copy of
//! CPU register values filled only by reads of the `ZDI_RD` registers.
//! Only the classifier mutates it.

/// One byte of a 24-bit ZDI data value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteLane {
    Low,
    High,
    Upper,
}

impl ByteLane {
    pub const ALL: [ByteLane; 3] = [Self::Low, Self::High, Self::Upper];

    /// Suffix used in register names (`ZDI_WR_L`, `ZDI_RD_U`, ...)
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Low => "L",
            Self::High => "H",
            Self::Upper => "U",
        }
    }

    fn shift(self) -> u32 {
        match self {
            Self::Low => 0,
            Self::High => 8,
            Self::Upper => 16,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Low => 0,
            Self::High => 1,
            Self::Upper => 2,
        }
    }
}

/// CPU registers reachable through `ZDI_RW_CTL` codes 0..=7 and 0x80..=0x87
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CpuRegister {
    #[default]
    MbaseAf,
    Bc,
    De,
    Hl,
    Ix,
    Iy,
    Sp,
    Pc,
}

impl CpuRegister {
    pub const ALL: [CpuRegister; 8] = [
        Self::MbaseAf,
        Self::Bc,
        Self::De,
        Self::Hl,
        Self::Ix,
        Self::Iy,
        Self::Sp,
        Self::Pc,
    ];

    /// Register for a 3-bit selector
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name as used in action texts
    pub fn name(self) -> &'static str {
        match self {
            Self::MbaseAf => "{MBASE, A, F}",
            Self::Bc => "BC",
            Self::De => "DE",
            Self::Hl => "HL",
            Self::Ix => "IX",
            Self::Iy => "IY",
            Self::Sp => "SP",
            Self::Pc => "PC",
        }
    }
}

/// Last known bytes of each CPU register
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowRegisters {
    slots: [[Option<u8>; 3]; 8],
}

impl ShadowRegisters {
    pub fn byte(&self, register: CpuRegister, lane: ByteLane) -> Option<u8> {
        self.slots[register.index()][lane.slot()]
    }

    /// Full 24-bit value, once all three bytes have been seen
    pub fn value(&self, register: CpuRegister) -> Option<u32> {
        ByteLane::ALL.iter().try_fold(0u32, |acc, &lane| {
            self.byte(register, lane)
                .map(|b| acc | (u32::from(b) << lane.shift()))
        })
    }

    pub(super) fn set(&mut self, register: CpuRegister, lane: ByteLane, value: u8) {
        self.slots[register.index()][lane.slot()] = Some(value);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pending_write_value: u32,
    selected_register: CpuRegister,
    shadow: ShadowRegisters,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 24-bit value assembled from `ZDI_WR_L/H/U` writes. Never cleared.
    pub fn pending_write_value(&self) -> u32 {
        self.pending_write_value
    }

    pub fn selected_register(&self) -> CpuRegister {
        self.selected_register
    }

    pub fn shadow(&self) -> &ShadowRegisters {
        &self.shadow
    }

    /// Replace one byte of the write accumulator
    pub(super) fn load_write_byte(&mut self, lane: ByteLane, value: u8) {
        let shift = lane.shift();
        self.pending_write_value =
            (self.pending_write_value & !(0xffu32 << shift)) | (u32::from(value) << shift);
    }

    pub(super) fn select_register(&mut self, register: CpuRegister) {
        self.selected_register = register;
    }

    /// A `ZDI_RD` byte was read back for the selected register
    pub(super) fn record_read(&mut self, lane: ByteLane, value: u8) {
        self.shadow.set(self.selected_register, lane, value);
    }
}

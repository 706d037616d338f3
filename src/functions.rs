//! Channel-strip function catalog
//!
//! The closed set of parameters the functional console can represent. Each
//! member carries a display label and a stable document key; neither the
//! engine nor the caches ever treat a function as a number.

/// One abstract channel-strip parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelFunction {
    // EQ, four bands
    EqLowFreq,
    EqLowGain,
    EqLowQ,
    EqLoMidFreq,
    EqLoMidGain,
    EqLoMidQ,
    EqHiMidFreq,
    EqHiMidGain,
    EqHiMidQ,
    EqHighFreq,
    EqHighGain,
    EqHighQ,
    // Filters
    FilterHp,
    FilterLp,
    // Dynamics
    CompThreshold,
    CompRatio,
    CompAttack,
    CompRelease,
    CompGain,
    GateThreshold,
    GateRange,
    GateRelease,
    // Master
    InputGain,
    OutputGain,
    PhaseReverse,
    Bypass,
}

impl ChannelFunction {
    /// Every catalog member, in declaration order.
    pub const ALL: [ChannelFunction; 26] = [
        ChannelFunction::EqLowFreq,
        ChannelFunction::EqLowGain,
        ChannelFunction::EqLowQ,
        ChannelFunction::EqLoMidFreq,
        ChannelFunction::EqLoMidGain,
        ChannelFunction::EqLoMidQ,
        ChannelFunction::EqHiMidFreq,
        ChannelFunction::EqHiMidGain,
        ChannelFunction::EqHiMidQ,
        ChannelFunction::EqHighFreq,
        ChannelFunction::EqHighGain,
        ChannelFunction::EqHighQ,
        ChannelFunction::FilterHp,
        ChannelFunction::FilterLp,
        ChannelFunction::CompThreshold,
        ChannelFunction::CompRatio,
        ChannelFunction::CompAttack,
        ChannelFunction::CompRelease,
        ChannelFunction::CompGain,
        ChannelFunction::GateThreshold,
        ChannelFunction::GateRange,
        ChannelFunction::GateRelease,
        ChannelFunction::InputGain,
        ChannelFunction::OutputGain,
        ChannelFunction::PhaseReverse,
        ChannelFunction::Bypass,
    ];

    /// Human-readable label shown on the presentation surface.
    pub fn label(self) -> &'static str {
        match self {
            ChannelFunction::EqLowFreq => "EQ Low Freq",
            ChannelFunction::EqLowGain => "EQ Low Gain",
            ChannelFunction::EqLowQ => "EQ Low Q",
            ChannelFunction::EqLoMidFreq => "EQ LoMid Freq",
            ChannelFunction::EqLoMidGain => "EQ LoMid Gain",
            ChannelFunction::EqLoMidQ => "EQ LoMid Q",
            ChannelFunction::EqHiMidFreq => "EQ HiMid Freq",
            ChannelFunction::EqHiMidGain => "EQ HiMid Gain",
            ChannelFunction::EqHiMidQ => "EQ HiMid Q",
            ChannelFunction::EqHighFreq => "EQ High Freq",
            ChannelFunction::EqHighGain => "EQ High Gain",
            ChannelFunction::EqHighQ => "EQ High Q",
            ChannelFunction::FilterHp => "High Pass",
            ChannelFunction::FilterLp => "Low Pass",
            ChannelFunction::CompThreshold => "Comp Thresh",
            ChannelFunction::CompRatio => "Comp Ratio",
            ChannelFunction::CompAttack => "Comp Attack",
            ChannelFunction::CompRelease => "Comp Release",
            ChannelFunction::CompGain => "Comp Gain",
            ChannelFunction::GateThreshold => "Gate Thresh",
            ChannelFunction::GateRange => "Gate Range",
            ChannelFunction::GateRelease => "Gate Release",
            ChannelFunction::InputGain => "Input Gain",
            ChannelFunction::OutputGain => "Output Gain",
            ChannelFunction::PhaseReverse => "Phase",
            ChannelFunction::Bypass => "Bypass",
        }
    }

    /// Stable key used when a profile document is function-indexed.
    pub fn key(self) -> &'static str {
        match self {
            ChannelFunction::EqLowFreq => "EQ_LOW_FREQ",
            ChannelFunction::EqLowGain => "EQ_LOW_GAIN",
            ChannelFunction::EqLowQ => "EQ_LOW_Q",
            ChannelFunction::EqLoMidFreq => "EQ_LOMID_FREQ",
            ChannelFunction::EqLoMidGain => "EQ_LOMID_GAIN",
            ChannelFunction::EqLoMidQ => "EQ_LOMID_Q",
            ChannelFunction::EqHiMidFreq => "EQ_HIMID_FREQ",
            ChannelFunction::EqHiMidGain => "EQ_HIMID_GAIN",
            ChannelFunction::EqHiMidQ => "EQ_HIMID_Q",
            ChannelFunction::EqHighFreq => "EQ_HIGH_FREQ",
            ChannelFunction::EqHighGain => "EQ_HIGH_GAIN",
            ChannelFunction::EqHighQ => "EQ_HIGH_Q",
            ChannelFunction::FilterHp => "FILTER_HP",
            ChannelFunction::FilterLp => "FILTER_LP",
            ChannelFunction::CompThreshold => "COMP_THRESHOLD",
            ChannelFunction::CompRatio => "COMP_RATIO",
            ChannelFunction::CompAttack => "COMP_ATTACK",
            ChannelFunction::CompRelease => "COMP_RELEASE",
            ChannelFunction::CompGain => "COMP_GAIN",
            ChannelFunction::GateThreshold => "GATE_THRESHOLD",
            ChannelFunction::GateRange => "GATE_RANGE",
            ChannelFunction::GateRelease => "GATE_RELEASE",
            ChannelFunction::InputGain => "INPUT_GAIN",
            ChannelFunction::OutputGain => "OUTPUT_GAIN",
            ChannelFunction::PhaseReverse => "PHASE_REVERSE",
            ChannelFunction::Bypass => "BYPASS",
        }
    }

    /// Reverse of [`key`](Self::key). Returns `None` for unknown keys, which
    /// is how a profile document is detected as hardware-indexed instead.
    pub fn from_key(key: &str) -> Option<ChannelFunction> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

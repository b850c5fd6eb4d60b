use crate::data::units::ProbeAttenuation;

pub const PROBE_ATTENUATIONS: [ProbeAttenuation; 2] = [ProbeAttenuation::X1, ProbeAttenuation::X10];

use crate::consts::*;

/// Bus speed the function is described for
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Speed {
    Full,
    High,
}

/// Construction time settings of [`CdcClass`](crate::CdcClass)
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct CdcConfig {
    pub speed: Speed,
    /// Arm the data OUT endpoint again as soon as `receive` returns. When false the
    /// application paces the host by calling `receive_packet` itself.
    pub rearm_on_receive: bool,
}

impl Default for CdcConfig {
    fn default() -> Self { CdcConfig { speed: Speed::Full, rearm_on_receive: true } }
}

impl CdcConfig {
    pub fn speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    pub fn rearm_on_receive(mut self, rearm: bool) -> Self {
        self.rearm_on_receive = rearm;
        self
    }

    /// Packet size of the bulk data endpoints
    pub fn max_packet_size(&self) -> u16 {
        match self.speed {
            Speed::Full => CDC_DATA_FS_MAX_PACKET_SIZE,
            Speed::High => CDC_DATA_HS_MAX_PACKET_SIZE,
        }
    }

    /// `bInterval` of the command endpoint
    pub fn cmd_interval(&self) -> u8 {
        match self.speed {
            Speed::Full => CDC_FS_BINTERVAL,
            Speed::High => CDC_HS_BINTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_selects_packet_size() {
        let config = CdcConfig::default();
        assert_eq!(config.max_packet_size(), 64);
        assert_eq!(config.cmd_interval(), CDC_FS_BINTERVAL);
        assert!(config.rearm_on_receive);

        let config = CdcConfig::default().speed(Speed::High).rearm_on_receive(false);
        assert_eq!(config.max_packet_size(), 512);
        assert_eq!(config.cmd_interval(), CDC_HS_BINTERVAL);
        assert!(!config.rearm_on_receive);
    }
}

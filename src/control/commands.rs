/// The four outbound opcodes the ring recognises (spec section 4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    EnableWave,
    DisableWave,
    WaitingForWave,
    GetAllRawData,
}

impl Command {
    fn opcode(self) -> &'static [u8] {
        match self {
            Command::EnableWave => &[0x02, 0x04],
            Command::DisableWave => &[0x02, 0x06],
            Command::WaitingForWave => &[0x02, 0x05],
            Command::GetAllRawData => &[0xA1, 0x03],
        }
    }

    /// Builds the 16-byte wire frame: opcode, zero pad, checksum in byte 15.
    pub fn to_bytes(self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let opcode = self.opcode();
        buf[..opcode.len()].copy_from_slice(opcode);

        let checksum: u32 = buf[0..15].iter().map(|&b| b as u32).sum();
        buf[15] = (checksum % 256) as u8;
        buf
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::EnableWave => "EnableWave",
            Command::DisableWave => "DisableWave",
            Command::WaitingForWave => "WaitingForWave",
            Command::GetAllRawData => "GetAllRawData",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn checksum_ok(bytes: &[u8; 16]) -> bool {
        let sum: u32 = bytes[0..15].iter().map(|&b| b as u32).sum();
        (sum % 256) as u8 == bytes[15]
    }

    #[test]
    fn enable_wave_opcode_and_checksum() {
        let bytes = Command::EnableWave.to_bytes();
        assert_eq!(&bytes[0..2], &[0x02, 0x04]);
        assert!(bytes[2..15].iter().all(|&b| b == 0));
        assert!(checksum_ok(&bytes));
    }

    #[test]
    fn all_commands_checksum_correctly() {
        for command in [
            Command::EnableWave,
            Command::DisableWave,
            Command::WaitingForWave,
            Command::GetAllRawData,
        ] {
            assert!(checksum_ok(&command.to_bytes()));
        }
    }

    #[test]
    fn get_all_raw_data_opcode() {
        let bytes = Command::GetAllRawData.to_bytes();
        assert_eq!(&bytes[0..2], &[0xA1, 0x03]);
    }
}

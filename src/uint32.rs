use byteorder::{ByteOrder, LittleEndian};

pub fn unpack(data: &[u8]) -> u32 {
    LittleEndian::read_u32(&data[..4])
}

pub fn unpack2(data: &[u8]) -> (u32, u32) {
    (unpack(&data[0..4]), unpack(&data[4..8]))
}

pub fn pack(data: &mut [u8], src: u32) {
    LittleEndian::write_u32(&mut data[..4], src);
}

pub fn pack2(data: &mut [u8], src0: u32, src1: u32) {
    pack(&mut data[0..4], src0);
    pack(&mut data[4..8], src1);
}

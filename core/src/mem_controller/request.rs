//! Memory operation request: what the Decode stage presents to the
//! memory controller each cycle (§3 "Memory operation request").

#[derive(Clone, Copy, Debug)]
pub enum MemRequest {
    RawRead {
        addr: u32,
    },
    RawWrite {
        addr: u32,
        value: i32,
    },
    GetField {
        handle: u32,
        field: u32,
    },
    PutField {
        handle: u32,
        field: u32,
        value: i32,
    },
    IaLoad {
        handle: u32,
        index: u32,
    },
    IaStore {
        handle: u32,
        index: u32,
        value: i32,
    },
    MethodFill {
        start_addr: u32,
        len_bytes: u32,
    },
    MemCopy {
        src: u32,
        dst: u32,
        len: u32,
    },
}

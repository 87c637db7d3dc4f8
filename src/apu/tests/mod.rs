// APU integration tests across the register interface

mod frame_irq_tests;
mod init_tests;

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Resources that pass data in the 'forward' direction, that is, CPU=>GPU.

Forward data flow is the common case: the CPU produces something (a decoded video frame, a
camera image, a software-rendered overlay) and the GPU samples it.

Only the dynamic variant lives here.  Data that is uploaded once needs no synchronization and can
go straight through the application's own device.

## Module Contents

- [dynamic] - resources whose contents change frequently
*/

pub mod dynamic;

use std::path::Path;
use std::{env, io};

use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

pub fn default_gen() -> impl RngCore {
    Xoshiro256PlusPlus::seed_from_u64(0x800D_BA5E_5EED_1234_u64)
}

mod near_attacks {
    use std::io::{self, BufWriter, Write};
    use std::{fs, path::Path};

    use finchess_base::bitboard::Bitboard;
    use finchess_base::types::Coord;

    fn generate_directed<const N: usize>(d_file: [isize; N], d_rank: [isize; N]) -> [Bitboard; 64] {
        let mut res = [Bitboard::EMPTY; 64];
        for c in Coord::iter() {
            let mut bb = Bitboard::EMPTY;
            for (&delta_file, &delta_rank) in d_file.iter().zip(d_rank.iter()) {
                if let Some(nc) = c.try_shift(delta_file, delta_rank) {
                    bb.set(nc);
                }
            }
            res[c.index()] = bb;
        }
        res
    }

    fn print_bitboards<W: Write>(w: &mut W, name: &str, bs: [Bitboard; 64]) -> io::Result<()> {
        writeln!(w, "const {}: [Bitboard; 64] = [", name)?;
        for (i, b) in bs.iter().enumerate() {
            writeln!(w, "    /*{:2}*/ bb(0x{:016x}),", i, b.as_raw())?;
        }
        writeln!(w, "];")?;
        Ok(())
    }

    pub fn gen(out_path: &Path) -> io::Result<()> {
        let f = fs::File::create(out_path)?;
        let mut w = BufWriter::new(&f);

        print_bitboards(
            &mut w,
            "KING_ATTACKS",
            generate_directed([-1, -1, -1, 0, 0, 1, 1, 1], [-1, 0, 1, -1, 1, -1, 0, 1]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "KNIGHT_ATTACKS",
            generate_directed([-2, -2, -1, -1, 2, 2, 1, 1], [-1, 1, -2, 2, -1, 1, -2, 2]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "WHITE_PAWN_ATTACKS",
            generate_directed([-1, 1], [1, 1]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "BLACK_PAWN_ATTACKS",
            generate_directed([-1, 1], [-1, -1]),
        )?;

        Ok(())
    }
}

mod magic {
    use std::io::{self, BufWriter, Write};
    use std::{fs, path::Path};

    use finchess_base::bitboard::Bitboard;
    use finchess_base::bitboard_consts;
    use finchess_base::types::Coord;
    use rand_core::RngCore;

    const FILE_FRAME: Bitboard = Bitboard::from_raw(0xff000000000000ff);
    const RANK_FRAME: Bitboard = Bitboard::from_raw(0x8181818181818181);
    const DIAG_FRAME: Bitboard = Bitboard::from_raw(0xff818181818181ff);

    trait Magic {
        const NAME: &'static str;
        const SHIFTS: &'static [(isize, isize)];

        fn build_mask(c: Coord) -> Bitboard;

        fn get_mask_size(c: Coord) -> usize {
            Self::build_mask(c).popcount() as usize
        }

        fn get_shift(c: Coord) -> usize {
            64 - Self::get_mask_size(c)
        }
    }

    struct BishopMagic;
    struct RookMagic;

    impl Magic for RookMagic {
        const NAME: &'static str = "ROOK";
        const SHIFTS: &'static [(isize, isize)] = &[(0, 1), (0, -1), (-1, 0), (1, 0)];

        fn build_mask(c: Coord) -> Bitboard {
            ((bitboard_consts::file(c.file()) & !FILE_FRAME)
                | (bitboard_consts::rank(c.rank()) & !RANK_FRAME))
                & !Bitboard::from_coord(c)
        }
    }

    impl Magic for BishopMagic {
        const NAME: &'static str = "BISHOP";
        const SHIFTS: &'static [(isize, isize)] = &[(-1, 1), (-1, -1), (1, -1), (1, 1)];

        fn build_mask(c: Coord) -> Bitboard {
            (bitboard_consts::DIAG[c.diag()] ^ bitboard_consts::ANTIDIAG[c.antidiag()])
                & !DIAG_FRAME
        }
    }

    fn attacks_from<M: Magic>(c: Coord, occupied: Bitboard) -> Bitboard {
        let mut res = Bitboard::EMPTY;
        for &(delta_file, delta_rank) in M::SHIFTS {
            let mut p = c;
            while let Some(new_p) = p.try_shift(delta_file, delta_rank) {
                res.set(new_p);
                if occupied.has(new_p) {
                    break;
                }
                p = new_p;
            }
        }
        res
    }

    fn is_valid_magic_const<M: Magic>(coord: Coord, magic: u64) -> bool {
        let mask = M::build_mask(coord);
        let shift = mask.popcount() as usize;
        let submask_cnt = 1_u64 << shift;
        let mut used = vec![false; submask_cnt as usize];
        for submask in 0..submask_cnt {
            let occupied = mask.deposit_bits(submask);
            let idx = (occupied.as_raw().wrapping_mul(magic) >> (64 - shift)) as usize;
            if used[idx] {
                return false;
            }
            used[idx] = true;
        }
        true
    }

    fn gen_sparse_number<R: RngCore>(r: &mut R) -> u64 {
        let mut res = 0;
        for _ in Coord::iter() {
            res <<= 1;
            if r.next_u64() % 8 == 0 {
                res |= 1;
            }
        }
        res
    }

    fn gen_magic_consts<M: Magic, R: RngCore>(r: &mut R) -> [u64; 64] {
        let mut res = [0; 64];
        for c in Coord::iter() {
            let cur = &mut res[c.index()];
            loop {
                *cur = gen_sparse_number(r);
                if is_valid_magic_const::<M>(c, *cur) {
                    break;
                }
            }
        }
        res
    }

    fn write_magic_tables<M: Magic, W: Write>(
        w: &mut W,
        magic_consts: [u64; 64],
    ) -> io::Result<()> {
        writeln!(w, "const MAGIC_CONSTS_{}: [u64; 64] = [", M::NAME)?;
        for (i, b) in magic_consts.iter().enumerate() {
            writeln!(w, "    /*{:2}*/ 0x{:016x},", i, b)?;
        }
        writeln!(w, "];")?;

        writeln!(w)?;

        writeln!(w, "const MAGIC_SHIFTS_{}: [u32; 64] = [", M::NAME)?;
        for c in Coord::iter() {
            writeln!(w, "    /*{:2}*/ {},", c.index(), M::get_shift(c))?;
        }
        writeln!(w, "];")?;

        writeln!(w)?;

        writeln!(w, "const MAGIC_MASKS_{}: [Bitboard; 64] = [", M::NAME)?;
        for c in Coord::iter() {
            writeln!(
                w,
                "    /*{:2}*/ bb(0x{:016x}),",
                c.index(),
                M::build_mask(c).as_raw()
            )?;
        }
        writeln!(w, "];")?;

        writeln!(w)?;

        // Each square owns its own slice of the lookup array, so the stored
        // attack sets are exact and need no post-masking.
        let mut offsets = [0_usize; 64];
        let mut total = 0;
        for c in Coord::iter() {
            offsets[c.index()] = total;
            total += 1 << M::get_mask_size(c);
        }

        writeln!(w, "const MAGIC_OFFSETS_{}: [usize; 64] = [", M::NAME)?;
        for c in Coord::iter() {
            writeln!(w, "    /*{:2}*/ {},", c.index(), offsets[c.index()])?;
        }
        writeln!(w, "];")?;

        writeln!(w)?;

        let lookups = {
            let mut lookups = vec![Bitboard::EMPTY; total];
            for c in Coord::iter() {
                let mask = M::build_mask(c);
                let magic = magic_consts[c.index()];
                let shift = mask.popcount() as usize;
                let submask_cnt = 1_u64 << shift;
                for submask in 0..submask_cnt {
                    let occupied = mask.deposit_bits(submask);
                    let idx = (occupied.as_raw().wrapping_mul(magic) >> (64 - shift)) as usize;
                    lookups[idx + offsets[c.index()]] = attacks_from::<M>(c, occupied);
                }
            }
            lookups
        };

        writeln!(
            w,
            "static MAGIC_LOOKUP_{}: [Bitboard; {}] = [",
            M::NAME,
            lookups.len()
        )?;
        for (i, b) in lookups.iter().enumerate() {
            writeln!(w, "    /*{}*/ bb(0x{:016x}),", i, b.as_raw())?;
        }
        writeln!(w, "];")?;

        Ok(())
    }

    fn gen_magic_tables<M: Magic, W: Write, R: RngCore>(w: &mut W, r: &mut R) -> io::Result<()> {
        write_magic_tables::<M, _>(w, gen_magic_consts::<M, _>(r))
    }

    pub fn gen(out_path: &Path) -> io::Result<()> {
        let f = fs::File::create(out_path)?;
        let mut w = BufWriter::new(&f);
        let mut r = super::default_gen();
        gen_magic_tables::<BishopMagic, _, _>(&mut w, &mut r)?;
        writeln!(w)?;
        gen_magic_tables::<RookMagic, _, _>(&mut w, &mut r)?;
        Ok(())
    }
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = env::var("OUT_DIR").unwrap();

    near_attacks::gen(&Path::new(&out_dir).join("near_attacks.rs"))?;
    magic::gen(&Path::new(&out_dir).join("magic.rs"))?;

    Ok(())
}
